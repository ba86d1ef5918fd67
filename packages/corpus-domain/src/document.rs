use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed document-type taxonomy the classifier maps into. Unknown values
/// fail schema validation and fall back to the default.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
	BuildingCode,
	EngineeringReport,
	Textbook,
	Specification,
	Drawing,
	#[default]
	GeneralPdf,
}
impl DocumentType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::BuildingCode => "building_code",
			Self::EngineeringReport => "engineering_report",
			Self::Textbook => "textbook",
			Self::Specification => "specification",
			Self::Drawing => "drawing",
			Self::GeneralPdf => "general_pdf",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"building_code" => Some(Self::BuildingCode),
			"engineering_report" => Some(Self::EngineeringReport),
			"textbook" => Some(Self::Textbook),
			"specification" => Some(Self::Specification),
			"drawing" => Some(Self::Drawing),
			"general_pdf" => Some(Self::GeneralPdf),
			_ => None,
		}
	}
}

/// Per-attachment ingestion state machine.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
	Pending,
	Processing,
	Ready,
	Error,
}
impl ProcessingState {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Processing => "processing",
			Self::Ready => "ready",
			Self::Error => "error",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"pending" => Some(Self::Pending),
			"processing" => Some(Self::Processing),
			"ready" => Some(Self::Ready),
			"error" => Some(Self::Error),
			_ => None,
		}
	}

	/// True when the injector must (re)run ingestion before retrieval.
	pub fn needs_ingestion(status: Option<Self>) -> bool {
		matches!(status, None | Some(Self::Pending) | Some(Self::Error))
	}
}

/// Chunk ids are a pure function of the attachment and the chunk index, so
/// re-ingestion overwrites instead of duplicating.
pub fn chunk_id(attachment_id: Uuid, chunk_index: i32) -> String {
	format!("{attachment_id}_chunk_{chunk_index}")
}

/// One ordered text unit from the document parser.
#[derive(Clone, Debug)]
pub struct PageUnit {
	pub page: Option<i32>,
	pub text: String,
}

/// Resolves missing page numbers by carrying the previous unit's page
/// forward, starting at 1.
pub fn assign_pages(units: &[PageUnit]) -> Vec<(i32, String)> {
	let mut current = 1;
	let mut out = Vec::with_capacity(units.len());

	for unit in units {
		if let Some(page) = unit.page {
			current = page;
		}

		out.push((current, unit.text.clone()));
	}

	out
}

/// Pairwise page-boundary merge: unit `i` is chunked together with unit
/// `i + 1` so content straddling a page break is kept intact. The merged
/// unit keeps the earlier page number.
pub fn merge_adjacent(units: &[(i32, String)]) -> Vec<(i32, String)> {
	units
		.iter()
		.enumerate()
		.map(|(i, (page, text))| match units.get(i + 1) {
			Some((_, next)) => (*page, format!("{text}\n{next}")),
			None => (*page, text.clone()),
		})
		.collect()
}
