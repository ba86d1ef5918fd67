use std::collections::HashMap;

use corpus_domain::{Category, ChunkMeta, DocumentType, VectorFilter, VectorMatch, VectorRecord};
use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
		PointsIdsList, Query, QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value,
		VectorParamsBuilder, value::Kind,
	},
};
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use crate::Result;

/// Point ids must be UUIDs, so each string chunk id maps to a stable UUIDv5.
/// Re-ingesting an attachment therefore overwrites its points in place.
pub fn point_id(chunk_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes())
}

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &corpus_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		self.client
			.create_collection(CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
				VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
			))
			.await?;

		Ok(())
	}

	pub async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<()> {
		if records.is_empty() {
			return Ok(());
		}

		let points =
			records.iter().map(|record| point_struct(namespace, record)).collect::<Vec<_>>();

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
			.await?;

		Ok(())
	}

	pub async fn query(
		&self,
		namespace: &str,
		vector: &[f32],
		filter: &VectorFilter,
		top_k: u64,
	) -> Result<Vec<VectorMatch>> {
		let mut must = vec![
			Condition::matches("namespace", namespace.to_string()),
			Condition::matches("category", filter.category.as_str().to_string()),
		];

		if let Some(ids) = &filter.attachment_ids {
			must.push(Condition::matches(
				"attachment_id",
				ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
			));
		}

		let filter = Filter { must, ..Default::default() };
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.filter(filter)
			.limit(top_k)
			.with_payload(true);
		let response = self.client.query(search).await?;
		let mut matches = Vec::with_capacity(response.result.len());

		for point in response.result {
			match parse_match(&point) {
				Some(hit) => matches.push(hit),
				None => warn!("Dropping similarity match with malformed payload."),
			}
		}

		Ok(matches)
	}

	pub async fn delete(&self, chunk_ids: &[String]) -> Result<()> {
		if chunk_ids.is_empty() {
			return Ok(());
		}

		let ids =
			chunk_ids.iter().map(|id| point_id(id).to_string().into()).collect::<Vec<_>>();

		self.client
			.delete_points(
				DeletePointsBuilder::new(self.collection.clone())
					.points(PointsIdsList { ids })
					.wait(true),
			)
			.await?;

		Ok(())
	}
}

fn point_struct(namespace: &str, record: &VectorRecord) -> PointStruct {
	let meta = &record.meta;
	let mut payload_map = HashMap::new();

	payload_map.insert("chunk_id".to_string(), Value::from(record.chunk_id.clone()));
	payload_map.insert("namespace".to_string(), Value::from(namespace.to_string()));
	payload_map.insert("attachment_id".to_string(), Value::from(meta.attachment_id.to_string()));
	payload_map.insert("file_name".to_string(), Value::from(meta.file_name.clone()));
	payload_map.insert("page".to_string(), Value::from(meta.page as i64));
	payload_map.insert("chunk_index".to_string(), Value::from(meta.chunk_index as i64));
	payload_map
		.insert("document_type".to_string(), Value::from(meta.document_type.as_str().to_string()));
	payload_map.insert(
		"main_sections".to_string(),
		Value::from(JsonValue::from(meta.main_sections.clone())),
	);
	payload_map.insert(
		"reference_sections".to_string(),
		Value::from(JsonValue::from(meta.reference_sections.clone())),
	);
	payload_map.insert("category".to_string(), Value::from(meta.category.as_str().to_string()));

	PointStruct::new(
		point_id(&record.chunk_id).to_string(),
		record.vector.clone(),
		Payload::from(payload_map),
	)
}

fn parse_match(point: &ScoredPoint) -> Option<VectorMatch> {
	let payload = &point.payload;
	let chunk_id = payload_string(payload, "chunk_id")?;
	let meta = ChunkMeta {
		attachment_id: payload_uuid(payload, "attachment_id")?,
		file_name: payload_string(payload, "file_name")?,
		page: payload_i32(payload, "page")?,
		chunk_index: payload_i32(payload, "chunk_index")?,
		document_type: payload_string(payload, "document_type")
			.and_then(|raw| DocumentType::parse(&raw))?,
		main_sections: payload_string_list(payload, "main_sections")?,
		reference_sections: payload_string_list(payload, "reference_sections")?,
		category: payload_string(payload, "category").and_then(|raw| Category::parse(&raw))?,
	};

	Some(VectorMatch { chunk_id, score: point.score, meta })
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_uuid(payload: &HashMap<String, Value>, key: &str) -> Option<Uuid> {
	let text = payload_string(payload, key)?;

	Uuid::parse_str(&text).ok()
}

fn payload_i32(payload: &HashMap<String, Value>, key: &str) -> Option<i32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => i32::try_from(*value).ok(),
		_ => None,
	}
}

fn payload_string_list(payload: &HashMap<String, Value>, key: &str) -> Option<Vec<String>> {
	let value = payload.get(key)?;
	let list = match &value.kind {
		Some(Kind::ListValue(list)) => list,
		_ => return None,
	};
	let mut out = Vec::with_capacity(list.values.len());

	for item in &list.values {
		match &item.kind {
			Some(Kind::StringValue(text)) => out.push(text.to_string()),
			_ => return None,
		}
	}

	Some(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_ids_are_stable_and_distinct() {
		let a = point_id("7f1c9a9e-0000-0000-0000-000000000000_chunk_0");
		let b = point_id("7f1c9a9e-0000-0000-0000-000000000000_chunk_0");
		let c = point_id("7f1c9a9e-0000-0000-0000-000000000000_chunk_1");

		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[test]
	fn payload_round_trips_through_parse() {
		let meta = ChunkMeta {
			attachment_id: Uuid::new_v4(),
			file_name: "report.pdf".into(),
			page: 3,
			chunk_index: 7,
			document_type: DocumentType::EngineeringReport,
			main_sections: vec!["4.2".into()],
			reference_sections: vec!["10.1.1".into()],
			category: Category::PersonalPerm,
		};
		let record =
			VectorRecord { chunk_id: "att_chunk_7".into(), vector: vec![0.0; 3], meta: meta.clone() };
		let point = point_struct("owner-1", &record);
		let scored = ScoredPoint { payload: point.payload, score: 0.9, ..Default::default() };
		let hit = parse_match(&scored).expect("payload should parse back");

		assert_eq!(hit.chunk_id, "att_chunk_7");
		assert_eq!(hit.meta, meta);
	}
}
