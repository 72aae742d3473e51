use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub name: Option<String>,
    pub role: Option<String>,
}

/// Key facts pulled out of a contract. Every field is nullable and always serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractExtraction {
    pub parties: Option<Vec<Party>>,
    pub effective_date: Option<String>,
    pub termination_date: Option<String>,
    pub governing_law: Option<String>,
    pub indemnification_clause: Option<String>,
    pub confidentiality_clause: Option<String>,
    pub key_terms: Option<Vec<String>>,
    pub document_type: Option<String>,
}

/// Outcome of an analysis call: the parsed schema, or the model's raw text when
/// it could not be read as that schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Analysis {
    Extracted(ContractExtraction),
    Unparsed { error: String, raw_response: String },
}

impl Analysis {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Analysis::Extracted(_))
    }
}
