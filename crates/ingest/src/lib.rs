pub mod chunk;
pub mod chunker;
pub mod samples;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig};
pub use samples::{sample_documents, DocumentMetadata, SampleDocument};
