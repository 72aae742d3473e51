pub mod template;

pub use template::DocumentTemplate;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use extract::{ChatMessage, LanguageModel};

const REFINER_SYSTEM_PROMPT: &str = "You are a legal document refiner.";

#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub draft: String,
    /// The type exactly as requested
    pub document_type: String,
    pub parameters_used: Map<String, Value>,
}

/// Fills a document template and has the model polish the result
pub struct Drafter {
    llm: Arc<dyn LanguageModel>,
}

impl Drafter {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn draft(
        &self,
        template: DocumentTemplate,
        document_type: &str,
        parameters: Map<String, Value>,
    ) -> Result<Draft> {
        let filled = template.render(&parameters);
        debug!(document_type, chars = filled.len(), "Filled template");

        let messages = [
            ChatMessage::system(REFINER_SYSTEM_PROMPT),
            ChatMessage::user(build_refinement_prompt(&filled)),
        ];

        let refined = self
            .llm
            .complete(&messages)
            .await
            .context("Failed to refine draft")?;

        Ok(Draft {
            draft: refined,
            document_type: document_type.to_string(),
            parameters_used: parameters,
        })
    }
}

fn build_refinement_prompt(draft: &str) -> String {
    format!(
        r#"Review the following legal document draft. Ensure legal coherence, grammatical correctness, and professional tone. Make any necessary minor adjustments without changing the core meaning or structure.

Document Draft:
{}

Refined Document:
"#,
        draft
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Echoes the draft section of the prompt back in upper case
    #[derive(Default)]
    struct ShoutingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for ShoutingModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            let prompt = messages[1].content.clone();
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok(prompt.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_draft_is_refined_and_parameters_echoed() {
        let model = Arc::new(ShoutingModel::default());
        let drafter = Drafter::new(model.clone());
        let parameters = json!({"party_a_name": "Acme Corp"}).as_object().cloned().unwrap();

        let draft = drafter
            .draft(DocumentTemplate::Nda, "NDA", parameters.clone())
            .await
            .unwrap();

        assert_eq!(draft.document_type, "NDA");
        assert_eq!(draft.parameters_used, parameters);
        assert!(draft.draft.contains("ACME CORP"));

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Review the following legal document draft."));
        assert!(prompts[0].contains("between Acme Corp"));
        assert!(prompts[0].contains("[PARTY_B_NAME]"));
    }
}
