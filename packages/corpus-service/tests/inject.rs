use corpus_domain::{Category, PageUnit};
use corpus_service::{InjectRequest, MetadataStore, inject::EXCERPTS_HEADER};
use corpus_storage::models::Attachment;
use corpus_testkit::Fixture;
use time::OffsetDateTime;
use uuid::Uuid;

const OWNER: &str = "owner-1";
const PROMPT: &str = "You are a structural engineering assistant.";

fn attachment(attachment_id: Uuid) -> Attachment {
	Attachment {
		attachment_id,
		owner_id: OWNER.to_string(),
		file_name: "upload.pdf".to_string(),
		category: Category::PersonalTemp.as_str().to_string(),
		is_temp: true,
		storage_path: format!("{OWNER}/upload.pdf"),
		created_at: OffsetDateTime::now_utc(),
	}
}

fn request(attached: Vec<Uuid>) -> InjectRequest {
	InjectRequest {
		owner_id: OWNER.to_string(),
		system_prompt: PROMPT.to_string(),
		query: "timber joist spans".to_string(),
		attached_temp_ids: attached,
	}
}

fn seed_document(fixture: &Fixture, row: &Attachment) {
	fixture.metadata.seed_attachment(row.clone());
	fixture.parser.set_units(vec![PageUnit {
		page: Some(1),
		text: "Allowable timber joist spans are tabulated here.".to_string(),
	}]);
	fixture.blob.insert(&row.storage_path, b"%PDF-1.7".to_vec());
	fixture
		.extractor
		.push(serde_json::json!({ "document_type": "general_pdf", "has_sections": false }));
}

#[tokio::test]
async fn pending_attachment_is_ingested_on_demand() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let row = attachment(attachment_id);

	seed_document(&fixture, &row);
	fixture
		.metadata
		.upsert_status(attachment_id, "pending", None, OffsetDateTime::now_utc())
		.await
		.unwrap();

	let service = fixture.service();
	let response = service.inject(&request(vec![attachment_id])).await.unwrap();

	assert_eq!(fixture.parser.calls(), 1);
	assert_eq!(fixture.metadata.status(attachment_id).unwrap().status, "ready");
	assert!(response.system_prompt.starts_with(PROMPT));
	assert!(response.system_prompt.contains(EXCERPTS_HEADER));
	assert!(response.system_prompt.contains("Allowable timber joist spans"));
	assert_eq!(response.query, "timber joist spans");
}

#[tokio::test]
async fn ready_attachment_is_not_reingested() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let row = attachment(attachment_id);

	seed_document(&fixture, &row);
	fixture
		.metadata
		.upsert_status(attachment_id, "pending", None, OffsetDateTime::now_utc())
		.await
		.unwrap();

	let service = fixture.service();

	service.inject(&request(vec![attachment_id])).await.unwrap();

	assert_eq!(fixture.parser.calls(), 1);

	// Second turn: already ready, so no parse happens.
	let response = service.inject(&request(vec![attachment_id])).await.unwrap();

	assert_eq!(fixture.parser.calls(), 1);
	assert!(response.system_prompt.contains(EXCERPTS_HEADER));
}

#[tokio::test]
async fn error_status_triggers_reingestion() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let row = attachment(attachment_id);

	seed_document(&fixture, &row);
	fixture
		.metadata
		.upsert_status(attachment_id, "error", Some("boom"), OffsetDateTime::now_utc())
		.await
		.unwrap();

	let service = fixture.service();

	service.inject(&request(vec![attachment_id])).await.unwrap();

	assert_eq!(fixture.parser.calls(), 1);
	assert_eq!(fixture.metadata.status(attachment_id).unwrap().status, "ready");
}

#[tokio::test]
async fn missing_attachment_row_is_skipped() {
	let fixture = Fixture::new();
	let service = fixture.service();
	let response = service.inject(&request(vec![Uuid::new_v4()])).await.unwrap();

	assert_eq!(fixture.parser.calls(), 0);
	assert_eq!(response.system_prompt, PROMPT);
}

#[tokio::test]
async fn no_matches_leaves_the_prompt_untouched() {
	let fixture = Fixture::new();
	let service = fixture.service();
	let response = service.inject(&request(Vec::new())).await.unwrap();

	assert_eq!(response.system_prompt, PROMPT);
	assert_eq!(response.query, "timber joist spans");
}

#[tokio::test]
async fn failed_on_demand_ingestion_does_not_fail_the_turn() {
	let fixture = Fixture::new();
	let attachment_id = Uuid::new_v4();
	let row = attachment(attachment_id);

	// Attachment row exists but the blob is missing, so ingestion fails.
	fixture.metadata.seed_attachment(row);

	let service = fixture.service();
	let response = service.inject(&request(vec![attachment_id])).await.unwrap();

	assert_eq!(response.system_prompt, PROMPT);
	assert_eq!(fixture.metadata.status(attachment_id).unwrap().status, "error");
}
