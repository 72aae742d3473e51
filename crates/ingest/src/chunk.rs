use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(doc_id: &str, index: usize, text: String) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            chunk_id: Self::chunk_id_for(doc_id, index),
            index,
            text,
        }
    }

    /// Collection id of the `index`-th chunk of a document: `{doc_id}_chunk_{index}`
    pub fn chunk_id_for(doc_id: &str, index: usize) -> String {
        format!("{}_chunk_{}", doc_id, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_format() {
        let chunk = Chunk::new("force_majeure_definition", 2, "text".to_string());
        assert_eq!(chunk.chunk_id, "force_majeure_definition_chunk_2");
        assert_eq!(chunk.index, 2);
    }
}
