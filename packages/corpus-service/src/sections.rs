use corpus_config::LlmProviderConfig;
use corpus_domain::{DocumentType, SectionScan, is_section_identifier};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::ExtractorProvider;

const SECTIONS_SYSTEM_PROMPT: &str = "\
You extract numbered section identifiers from engineering text. Reply with a \
single JSON object holding exactly two keys: \"main_sections\" (identifiers \
of headings introduced in this text, e.g. \"4.2\") and \
\"reference_sections\" (identifiers merely cited in running text). Both \
values are arrays of dotted identifier strings. No other keys, no prose.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionPayload {
	#[serde(default)]
	main_sections: Vec<String>,
	#[serde(default)]
	reference_sections: Vec<String>,
}

/// Chunk-scoped, regex-first section extraction. The line-anchored scan runs
/// over the source unit (decoding a token window loses line breaks), then is
/// narrowed to the identifiers the chunk actually contains. The LLM is
/// consulted only when that leaves a chunk with no main sections; its answer
/// is validated against the identifier grammar and dropped wholesale on
/// failure.
pub(crate) async fn extract_sections(
	cfg: &LlmProviderConfig,
	extractor: &dyn ExtractorProvider,
	document_type: DocumentType,
	unit_scan: &SectionScan,
	chunk_text: &str,
) -> SectionScan {
	let scan = unit_scan.restrict_to(chunk_text);

	if !scan.main_sections.is_empty() {
		return scan;
	}

	let messages = [
		serde_json::json!({ "role": "system", "content": SECTIONS_SYSTEM_PROMPT }),
		serde_json::json!({
			"role": "user",
			"content": format!("Document type: {}\n\nText:\n{chunk_text}", document_type.as_str()),
		}),
	];

	match extractor.extract(cfg, &messages).await {
		Ok(value) => match parse_sections(value) {
			Some(parsed) => parsed,
			None => {
				warn!("Section extractor returned invalid identifiers; keeping regex scan.");

				scan
			},
		},
		Err(err) => {
			warn!(error = %err, "Section extractor call failed; keeping regex scan.");

			scan
		},
	}
}

fn parse_sections(value: Value) -> Option<SectionScan> {
	let payload: SectionPayload = serde_json::from_value(value).ok()?;
	let main_sections: Vec<String> =
		payload.main_sections.into_iter().filter(|id| is_section_identifier(id)).collect();
	let mut reference_sections: Vec<String> =
		payload.reference_sections.into_iter().filter(|id| is_section_identifier(id)).collect();

	reference_sections.retain(|id| !main_sections.contains(id));

	Some(SectionScan { main_sections, reference_sections })
}
