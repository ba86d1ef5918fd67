use std::sync::LazyLock;

use regex::Regex;

// A structural identifier: 1-3 leading digits and 1-6 dotted sub-levels,
// e.g. "4.2" or "10.1.3".
const IDENTIFIER: &str = r"\d{1,3}(?:\.\d{1,3}){1,6}";

static LINE_START: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"(?m)^\s*({IDENTIFIER})\b")).expect("Section regex must compile.")
});
static ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"\b({IDENTIFIER})\b")).expect("Section regex must compile.")
});
static FULL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"^{IDENTIFIER}$")).expect("Section regex must compile.")
});

/// Section identifiers found in one chunk: headings introduced at line starts
/// versus identifiers merely cited in running text.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SectionScan {
	pub main_sections: Vec<String>,
	pub reference_sections: Vec<String>,
}
impl SectionScan {
	pub fn is_empty(&self) -> bool {
		self.main_sections.is_empty() && self.reference_sections.is_empty()
	}

	/// Narrows the scan to the identifiers that actually occur in `text`.
	/// Chunk windows inherit the heading/citation split from their source
	/// unit, but never carry a section the window does not contain.
	pub fn restrict_to(&self, text: &str) -> SectionScan {
		let mut present: Vec<String> = Vec::new();

		for capture in ANYWHERE.captures_iter(text) {
			let id = capture[1].to_string();

			if !present.contains(&id) {
				present.push(id);
			}
		}

		SectionScan {
			main_sections: self
				.main_sections
				.iter()
				.filter(|id| present.contains(*id))
				.cloned()
				.collect(),
			reference_sections: self
				.reference_sections
				.iter()
				.filter(|id| present.contains(*id))
				.cloned()
				.collect(),
		}
	}
}

/// Deterministic pass of the section extractor. Line-anchored identifiers are
/// main sections; every other identifier occurrence that is not already a
/// main section is a reference. Both lists are de-duplicated in first-seen
/// order.
pub fn scan_sections(text: &str) -> SectionScan {
	let mut main_sections: Vec<String> = Vec::new();

	for capture in LINE_START.captures_iter(text) {
		let id = capture[1].to_string();

		if !main_sections.contains(&id) {
			main_sections.push(id);
		}
	}

	let mut reference_sections: Vec<String> = Vec::new();

	for capture in ANYWHERE.captures_iter(text) {
		let id = capture[1].to_string();

		if !main_sections.contains(&id) && !reference_sections.contains(&id) {
			reference_sections.push(id);
		}
	}

	SectionScan { main_sections, reference_sections }
}

/// Whether a candidate string is exactly one identifier. Used to validate
/// LLM-supplied section lists.
pub fn is_section_identifier(candidate: &str) -> bool {
	FULL.is_match(candidate)
}
