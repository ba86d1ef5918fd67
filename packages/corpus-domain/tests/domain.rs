use uuid::Uuid;

use corpus_domain::{
	Category, ChunkMeta, DocumentType, GLOBAL_NAMESPACE, PageUnit, ProcessingState, VectorFilter,
	assign_pages, chunk_id, is_section_identifier, merge_adjacent, scan_sections,
};

#[test]
fn chunk_id_is_deterministic() {
	let attachment_id = Uuid::parse_str("6f8a2c1e-9f10-4d2b-8c3a-0d5e7b1a9f00").unwrap();

	assert_eq!(chunk_id(attachment_id, 0), chunk_id(attachment_id, 0));
	assert_eq!(chunk_id(attachment_id, 3), format!("{attachment_id}_chunk_3"));
	assert_ne!(chunk_id(attachment_id, 1), chunk_id(attachment_id, 2));
}

#[test]
fn category_maps_to_namespace() {
	assert_eq!(Category::PersonalPerm.namespace("owner-1"), "owner-1");
	assert_eq!(Category::PersonalTemp.namespace("owner-1"), "owner-1");
	assert_eq!(Category::GlobalPerm.namespace("owner-1"), GLOBAL_NAMESPACE);
}

#[test]
fn category_round_trips_through_strings() {
	for category in Category::retrieval_tiers() {
		assert_eq!(Category::parse(category.as_str()), Some(category));
	}

	assert_eq!(Category::parse("personal"), None);
}

#[test]
fn retrieval_tier_order_is_fixed() {
	assert_eq!(
		Category::retrieval_tiers(),
		[Category::PersonalPerm, Category::PersonalTemp, Category::GlobalPerm]
	);
}

#[test]
fn processing_state_gates_ingestion() {
	assert!(ProcessingState::needs_ingestion(None));
	assert!(ProcessingState::needs_ingestion(Some(ProcessingState::Pending)));
	assert!(ProcessingState::needs_ingestion(Some(ProcessingState::Error)));
	assert!(!ProcessingState::needs_ingestion(Some(ProcessingState::Ready)));
	assert!(!ProcessingState::needs_ingestion(Some(ProcessingState::Processing)));
}

#[test]
fn document_type_defaults_to_general_pdf() {
	assert_eq!(DocumentType::default(), DocumentType::GeneralPdf);
	assert_eq!(
		serde_json::from_str::<DocumentType>("\"building_code\"").unwrap(),
		DocumentType::BuildingCode
	);
	assert!(serde_json::from_str::<DocumentType>("\"novel\"").is_err());
}

#[test]
fn line_start_identifiers_are_main_sections() {
	let scan = scan_sections("4.2 Load combinations\nSee 4.3.1 for details.\n  10.1.3 Anchors\n");

	assert_eq!(scan.main_sections, vec!["4.2", "10.1.3"]);
	assert_eq!(scan.reference_sections, vec!["4.3.1"]);
}

#[test]
fn main_sections_are_not_repeated_as_references() {
	let scan = scan_sections("4.2 Loads\nAs defined in 4.2, the load factor applies.\n");

	assert_eq!(scan.main_sections, vec!["4.2"]);
	assert!(scan.reference_sections.is_empty());
}

#[test]
fn restricting_a_scan_drops_absent_identifiers() {
	let scan = scan_sections("4.2 Loads\n10.1.3 Anchors\nSee 7.8 and 9.1 for details.\n");
	let narrowed = scan.restrict_to("10.1.3 Anchors anchor bolts per 9.1");

	assert_eq!(narrowed.main_sections, vec!["10.1.3"]);
	assert_eq!(narrowed.reference_sections, vec!["9.1"]);
}

#[test]
fn plain_integers_are_not_identifiers() {
	let scan = scan_sections("7 workers moved 1500 bricks\n");

	assert!(scan.is_empty());
}

#[test]
fn sub_level_depth_is_bounded() {
	assert!(is_section_identifier("1.2.3.4.5.6.7"));
	assert!(!is_section_identifier("1.2.3.4.5.6.7.8"));
	assert!(!is_section_identifier("42"));
	assert!(!is_section_identifier("4.2 Loads"));
	assert!(!is_section_identifier("1234.5"));
}

#[test]
fn pages_carry_forward_from_one() {
	let units = vec![
		PageUnit { page: None, text: "cover".to_string() },
		PageUnit { page: Some(2), text: "body".to_string() },
		PageUnit { page: None, text: "more".to_string() },
	];

	assert_eq!(
		assign_pages(&units),
		vec![(1, "cover".to_string()), (2, "body".to_string()), (2, "more".to_string())]
	);
}

#[test]
fn adjacent_units_merge_pairwise() {
	let units =
		vec![(1, "alpha".to_string()), (2, "bravo".to_string()), (3, "charlie".to_string())];

	assert_eq!(
		merge_adjacent(&units),
		vec![
			(1, "alpha\nbravo".to_string()),
			(2, "bravo\ncharlie".to_string()),
			(3, "charlie".to_string()),
		]
	);
}

#[test]
fn filter_requires_category_and_optional_attachment_match() {
	let attachment_id = Uuid::new_v4();
	let meta = ChunkMeta {
		attachment_id,
		file_name: "report.pdf".to_string(),
		page: 1,
		chunk_index: 0,
		document_type: DocumentType::GeneralPdf,
		main_sections: Vec::new(),
		reference_sections: Vec::new(),
		category: Category::PersonalTemp,
	};

	assert!(VectorFilter::category(Category::PersonalTemp).matches(&meta));
	assert!(!VectorFilter::category(Category::PersonalPerm).matches(&meta));
	assert!(
		VectorFilter { category: Category::PersonalTemp, attachment_ids: Some(vec![attachment_id]) }
			.matches(&meta)
	);
	assert!(
		!VectorFilter { category: Category::PersonalTemp, attachment_ids: Some(vec![Uuid::new_v4()]) }
			.matches(&meta)
	);
}
