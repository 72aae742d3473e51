use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to every chunk of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleDocument {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl SampleDocument {
    fn new(id: &str, text: &str, source: &str, doc_type: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            metadata: DocumentMetadata {
                source: source.to_string(),
                doc_type: doc_type.to_string(),
            },
        }
    }
}

/// The fixed reference corpus loaded by the sample ingestion endpoint
pub fn sample_documents() -> Vec<SampleDocument> {
    vec![
        SampleDocument::new(
            "contract_law_basics",
            "Contract law is a body of law that governs oral and written agreements associated with exchange of goods and services, money, and properties. It includes topics such as the nature of contractual obligations, limitation of actions, freedom of contract, privacy of contract, termination of contract, and covers also agency relationships, commercial paper, and contracts of employment. The essential elements of a contract are: offer, acceptance, consideration, and mutual assent. A contract must also have a lawful purpose and the parties must have legal capacity to enter into the agreement.",
            "Contract Law Fundamentals",
            "educational",
        ),
        SampleDocument::new(
            "force_majeure_definition",
            "Force majeure is a French term that literally means 'greater force.' It refers to a clause that is included in contracts to remove liability for natural and unavoidable catastrophes that interrupt the expected course of events and prevent participants from fulfilling obligations. Force majeure clauses typically cover natural disasters like earthquakes, hurricanes, and floods, as well as human actions such as terrorism, labor strikes, and governmental actions. The specific events covered by a force majeure clause depend on the language of the particular contract.",
            "Legal Dictionary",
            "definition",
        ),
        SampleDocument::new(
            "indemnification_clause",
            "An indemnification clause is a contractual provision in which one party agrees to compensate another party for certain damages, losses, or liabilities. The indemnifying party agrees to hold harmless and defend the indemnified party against claims, lawsuits, damages, and expenses arising from specified circumstances. Indemnification clauses are common in many types of contracts, including service agreements, lease agreements, and purchase agreements. The scope of indemnification can vary widely depending on the specific language used in the clause.",
            "Contract Clauses Guide",
            "educational",
        ),
    ]
}
