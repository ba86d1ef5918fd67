pub mod category;
pub mod document;
pub mod sections;
pub mod vector;

pub use category::{Category, GLOBAL_NAMESPACE};
pub use document::{DocumentType, PageUnit, ProcessingState, assign_pages, chunk_id, merge_adjacent};
pub use sections::{SectionScan, is_section_identifier, scan_sections};
pub use vector::{ChunkMeta, VectorFilter, VectorMatch, VectorRecord};
