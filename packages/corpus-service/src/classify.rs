use corpus_config::LlmProviderConfig;
use corpus_domain::DocumentType;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::ExtractorProvider;

const CLASSIFY_SYSTEM_PROMPT: &str = "\
You classify engineering documents. Reply with a single JSON object holding \
exactly two keys: \"document_type\" (one of \"building_code\", \
\"engineering_report\", \"textbook\", \"specification\", \"drawing\", \
\"general_pdf\") and \"has_sections\" (true when the document uses numbered \
section headings such as 4.2 or 10.1.3, false otherwise). No other keys, no \
prose.";

/// Document profile produced by the classifier. Any malformed or failing
/// response degrades to the default profile instead of aborting ingestion.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Classification {
	pub document_type: DocumentType,
	pub has_sections: bool,
}
impl Default for Classification {
	fn default() -> Self {
		Self { document_type: DocumentType::GeneralPdf, has_sections: false }
	}
}

pub(crate) async fn classify(
	cfg: &LlmProviderConfig,
	extractor: &dyn ExtractorProvider,
	file_name: &str,
	sample: &str,
) -> Classification {
	let messages = [
		serde_json::json!({ "role": "system", "content": CLASSIFY_SYSTEM_PROMPT }),
		serde_json::json!({
			"role": "user",
			"content": format!("File name: {file_name}\n\nDocument sample:\n{sample}"),
		}),
	];

	match extractor.extract(cfg, &messages).await {
		Ok(value) => parse_classification(value).unwrap_or_else(|| {
			warn!(file_name, "Classifier returned an invalid document profile; using defaults.");

			Classification::default()
		}),
		Err(err) => {
			warn!(file_name, error = %err, "Classifier call failed; using defaults.");

			Classification::default()
		},
	}
}

fn parse_classification(value: Value) -> Option<Classification> {
	serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_known_profile() {
		let value =
			serde_json::json!({ "document_type": "building_code", "has_sections": true });
		let parsed = parse_classification(value).expect("profile should parse");

		assert_eq!(parsed.document_type, DocumentType::BuildingCode);
		assert!(parsed.has_sections);
	}

	#[test]
	fn rejects_unknown_document_type() {
		let value = serde_json::json!({ "document_type": "novel", "has_sections": false });

		assert!(parse_classification(value).is_none());
	}

	#[test]
	fn rejects_extra_keys() {
		let value = serde_json::json!({
			"document_type": "textbook",
			"has_sections": false,
			"confidence": 0.9,
		});

		assert!(parse_classification(value).is_none());
	}
}
