use std::sync::Arc;

use corpus_domain::{Category, DocumentType, PageUnit, chunk_id};
use corpus_service::{IngestRequest, RagService};
use corpus_testkit::{Fixture, ShortEmbedder, TEST_VECTOR_DIM, test_config};
use uuid::Uuid;

const OWNER: &str = "owner-1";

fn sample_units() -> Vec<PageUnit> {
	vec![
		PageUnit {
			page: Some(1),
			text: "General requirements apply to structures. See 1.2 for scope.".to_string(),
		},
		PageUnit {
			page: Some(2),
			text: "4.2 Snow Loads\nDesign snow loads shall follow section 7.8 of this code."
				.to_string(),
		},
	]
}

fn request(attachment_id: Uuid, category: Category) -> IngestRequest {
	IngestRequest {
		attachment_id,
		owner_id: OWNER.to_string(),
		file_name: "code.pdf".to_string(),
		category,
		storage_path: format!("{OWNER}/code.pdf"),
	}
}

fn classification_profile() -> serde_json::Value {
	serde_json::json!({ "document_type": "building_code", "has_sections": true })
}

fn prepare(fixture: &Fixture, req: &IngestRequest) {
	fixture.parser.set_units(sample_units());
	fixture.blob.insert(&req.storage_path, b"%PDF-1.7".to_vec());
	fixture.extractor.push(classification_profile());
}

#[tokio::test]
async fn ingest_marks_ready_and_indexes_sectioned_chunks() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalPerm);

	prepare(&fixture, &req);

	let service = fixture.service();
	let report = service.ingest_attachment(&req).await.expect("ingestion should succeed");

	// One merged unit per page, each short enough for a single window.
	assert_eq!(report.chunks, 2);

	let status = fixture.metadata.status(attachment_id).expect("status row should exist");

	assert_eq!(status.status, "ready");
	assert_eq!(status.error_message, None);

	let first = fixture
		.metadata
		.chunk(&chunk_id(attachment_id, 0))
		.expect("first chunk row should exist");

	assert_eq!(first.page, 1);
	assert_eq!(first.main_sections, vec!["4.2".to_string()]);
	assert!(first.reference_sections.contains(&"1.2".to_string()));
	assert!(first.reference_sections.contains(&"7.8".to_string()));

	let second = fixture
		.metadata
		.chunk(&chunk_id(attachment_id, 1))
		.expect("second chunk row should exist");

	assert_eq!(second.page, 2);
	assert_eq!(second.main_sections, vec!["4.2".to_string()]);

	// personal_perm indexes into the owner namespace.
	assert_eq!(fixture.vectors.point_count(OWNER), 2);

	let meta = fixture
		.vectors
		.meta(OWNER, &chunk_id(attachment_id, 0))
		.expect("vector payload should exist");

	assert_eq!(meta.document_type, DocumentType::BuildingCode);
	assert_eq!(meta.category, Category::PersonalPerm);
	assert_eq!(meta.file_name, "code.pdf");

	// Sections came from the regex scan, so the extractor was only asked to
	// classify.
	assert_eq!(fixture.extractor.calls(), 1);
}

#[tokio::test]
async fn ingest_twice_produces_the_same_chunk_ids() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalPerm);

	prepare(&fixture, &req);

	let service = fixture.service();
	let first = service.ingest_attachment(&req).await.expect("first ingestion should succeed");

	fixture.extractor.push(classification_profile());

	let second = service.ingest_attachment(&req).await.expect("second ingestion should succeed");

	assert_eq!(first.chunks, second.chunks);
	assert_eq!(fixture.metadata.chunk_count(attachment_id), first.chunks);
	assert_eq!(fixture.vectors.point_count(OWNER), first.chunks);
}

#[tokio::test]
async fn section_attribution_is_scoped_to_each_chunk() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalPerm);

	// Ten-token windows split the heading and the citation into different
	// chunks.
	fixture.parser.set_units(vec![PageUnit {
		page: Some(1),
		text: "4.2 Snow Loads\nDesign snow loads shall follow the mapped values in section 7.8 \
		       of this code."
			.to_string(),
	}]);
	fixture.blob.insert(&req.storage_path, b"%PDF-1.7".to_vec());
	fixture.extractor.push(classification_profile());
	fixture
		.extractor
		.push(serde_json::json!({ "main_sections": [], "reference_sections": ["7.8"] }));

	let mut cfg = test_config();

	cfg.chunking.max_tokens = 10;
	cfg.chunking.overlap_tokens = 0;

	let service = fixture.service_with(cfg, fixture.providers());
	let report = service.ingest_attachment(&req).await.expect("ingestion should succeed");

	assert_eq!(report.chunks, 2);

	// The heading chunk carries "4.2" but not the citation it never saw.
	let first = fixture
		.metadata
		.chunk(&chunk_id(attachment_id, 0))
		.expect("first chunk row should exist");

	assert_eq!(first.main_sections, vec!["4.2".to_string()]);
	assert!(first.reference_sections.is_empty());

	// The citation chunk has no heading, so the fallback ran for it alone.
	let second = fixture
		.metadata
		.chunk(&chunk_id(attachment_id, 1))
		.expect("second chunk row should exist");

	assert!(second.main_sections.is_empty());
	assert_eq!(second.reference_sections, vec!["7.8".to_string()]);
	assert_eq!(fixture.extractor.calls(), 2);
}

#[tokio::test]
async fn section_fallback_outage_keeps_the_regex_references() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalPerm);

	fixture.parser.set_units(vec![PageUnit {
		page: Some(1),
		text: "4.2 Snow Loads\nDesign snow loads shall follow the mapped values in section 7.8 \
		       of this code."
			.to_string(),
	}]);
	fixture.blob.insert(&req.storage_path, b"%PDF-1.7".to_vec());
	// Only the classification is scripted; the fallback call for the
	// heading-less chunk fails.
	fixture.extractor.push(classification_profile());

	let mut cfg = test_config();

	cfg.chunking.max_tokens = 10;
	cfg.chunking.overlap_tokens = 0;

	let service = fixture.service_with(cfg, fixture.providers());

	service.ingest_attachment(&req).await.expect("ingestion should survive the outage");

	let second = fixture
		.metadata
		.chunk(&chunk_id(attachment_id, 1))
		.expect("second chunk row should exist");

	assert!(second.main_sections.is_empty());
	assert_eq!(second.reference_sections, vec!["7.8".to_string()]);
	assert_eq!(fixture.extractor.calls(), 2);
}

#[tokio::test]
async fn classifier_failure_defaults_profile_and_skips_sections() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalPerm);

	fixture.parser.set_units(sample_units());
	fixture.blob.insert(&req.storage_path, b"%PDF-1.7".to_vec());

	let mut providers = fixture.providers();

	providers.extractor = Arc::new(corpus_testkit::FailingExtractor);

	let service = fixture.service_with(test_config(), providers);

	service.ingest_attachment(&req).await.expect("ingestion should survive classifier outage");

	let status = fixture.metadata.status(attachment_id).expect("status row should exist");

	assert_eq!(status.status, "ready");

	// has_sections defaulted to false: even though the text carries a
	// line-start identifier, no section pass ran.
	let first = fixture
		.metadata
		.chunk(&chunk_id(attachment_id, 0))
		.expect("first chunk row should exist");

	assert!(first.main_sections.is_empty());
	assert!(first.reference_sections.is_empty());

	let meta = fixture
		.vectors
		.meta(OWNER, &chunk_id(attachment_id, 0))
		.expect("vector payload should exist");

	assert_eq!(meta.document_type, DocumentType::GeneralPdf);
}

#[tokio::test]
async fn embedding_count_mismatch_ends_in_error_status() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalPerm);

	prepare(&fixture, &req);

	let mut providers = fixture.providers();

	providers.embedding = Arc::new(ShortEmbedder::new(TEST_VECTOR_DIM as usize));

	let service = fixture.service_with(test_config(), providers);

	assert!(service.ingest_attachment(&req).await.is_err());

	let status = fixture.metadata.status(attachment_id).expect("status row should exist");

	assert_eq!(status.status, "error");
	assert!(status.error_message.unwrap_or_default().contains("mismatch"));
	assert_eq!(fixture.vectors.point_count(OWNER), 0);
}

#[tokio::test]
async fn empty_parse_ends_in_error_status() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::PersonalTemp);

	fixture.blob.insert(&req.storage_path, b"%PDF-1.7".to_vec());

	let service: RagService = fixture.service();

	assert!(service.ingest_attachment(&req).await.is_err());

	let status = fixture.metadata.status(attachment_id).expect("status row should exist");

	assert_eq!(status.status, "error");
	assert_eq!(fixture.metadata.chunk_count(attachment_id), 0);
}

#[tokio::test]
async fn global_category_indexes_into_the_shared_namespace() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let req = request(attachment_id, Category::GlobalPerm);

	prepare(&fixture, &req);

	let service = fixture.service();

	service.ingest_attachment(&req).await.expect("ingestion should succeed");

	assert_eq!(fixture.vectors.point_count("global"), 2);
	assert_eq!(fixture.vectors.point_count(OWNER), 0);
}
