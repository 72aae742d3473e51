pub mod llm;
pub mod prompt;
pub mod schema;
pub mod summarize;

pub use llm::{ChatClient, ChatMessage, LanguageModel, Role};
pub use schema::{Analysis, ContractExtraction, Party};
pub use summarize::{Summarizer, Summary, SummaryType};

use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse LLM response as JSON";

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n(.*?)\n?\s*```\s*$").expect("valid fence pattern")
});

/// Pulls structured contract facts out of document text
pub struct Extractor {
    llm: Arc<dyn LanguageModel>,
}

impl Extractor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// One model call; output that does not fit the schema comes back as
    /// `Analysis::Unparsed` rather than an error
    pub async fn extract(&self, document_text: &str) -> Result<Analysis> {
        let messages = [
            ChatMessage::system(prompt::EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(prompt::build_extraction_prompt(document_text)),
        ];

        let response = self
            .llm
            .complete(&messages)
            .await
            .context("Failed to extract contract information")?;

        Ok(parse_extraction(&response))
    }
}

pub fn parse_extraction(response: &str) -> Analysis {
    let body = CODE_FENCE
        .captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response);

    match serde_json::from_str::<ContractExtraction>(body) {
        Ok(extraction) => Analysis::Extracted(extraction),
        Err(e) => {
            warn!(error = %e, "Model output did not match the extraction schema");
            Analysis::Unparsed {
                error: PARSE_FAILURE_MESSAGE.to_string(),
                raw_response: response.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedModel(&'static str);

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
            anyhow::bail!("rate limited")
        }
    }

    const SCHEMA_KEYS: [&str; 8] = [
        "parties",
        "effective_date",
        "termination_date",
        "governing_law",
        "indemnification_clause",
        "confidentiality_clause",
        "key_terms",
        "document_type",
    ];

    #[test]
    fn test_parse_full_extraction() {
        let raw = r#"{
            "parties": [{"name": "Company A", "role": "Seller"}, {"name": "Company B", "role": "Buyer"}],
            "effective_date": "2024-01-01",
            "termination_date": null,
            "governing_law": "California",
            "indemnification_clause": null,
            "confidentiality_clause": null,
            "key_terms": ["purchase price"],
            "document_type": "Sales Agreement"
        }"#;

        let Analysis::Extracted(extraction) = parse_extraction(raw) else {
            panic!("expected structured extraction");
        };
        let parties = extraction.parties.unwrap();
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[1].role.as_deref(), Some("Buyer"));
        assert_eq!(extraction.governing_law.as_deref(), Some("California"));
        assert_eq!(extraction.termination_date, None);
    }

    #[test]
    fn test_missing_keys_serialize_as_null() {
        let analysis = parse_extraction(r#"{"document_type": "NDA"}"#);
        assert!(analysis.is_extracted());

        let value = serde_json::to_value(&analysis).unwrap();
        let object = value.as_object().unwrap();
        for key in SCHEMA_KEYS {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(object["document_type"], "NDA");
        assert!(object["governing_law"].is_null());
    }

    #[test]
    fn test_fenced_json_is_accepted() {
        let raw = "```json\n{\"governing_law\": \"New York\"}\n```";
        let Analysis::Extracted(extraction) = parse_extraction(raw) else {
            panic!("expected structured extraction");
        };
        assert_eq!(extraction.governing_law.as_deref(), Some("New York"));
    }

    #[test]
    fn test_non_json_falls_back_to_raw_response() {
        let raw = "I'm sorry, I cannot find a contract in this text.";
        let analysis = parse_extraction(raw);

        assert_eq!(
            serde_json::to_value(&analysis).unwrap(),
            serde_json::json!({
                "error": "Failed to parse LLM response as JSON",
                "raw_response": raw
            })
        );
    }

    #[test]
    fn test_json_of_wrong_shape_falls_back() {
        assert!(!parse_extraction("[1, 2, 3]").is_extracted());
        assert!(!parse_extraction("null").is_extracted());
        assert!(!parse_extraction(r#"{"parties": "Company A"}"#).is_extracted());
    }

    #[tokio::test]
    async fn test_extractor_uses_model_output() {
        let extractor = Extractor::new(Arc::new(CannedModel(r#"{"effective_date": "2024-01-01"}"#)));
        let analysis = extractor.extract("Effective January 1, 2024.").await.unwrap();

        assert_eq!(
            analysis,
            Analysis::Extracted(ContractExtraction {
                effective_date: Some("2024-01-01".to_string()),
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let extractor = Extractor::new(Arc::new(FailingModel));
        let err = extractor.extract("text").await.unwrap_err();
        assert!(format!("{:#}", err).contains("rate limited"));
    }
}
