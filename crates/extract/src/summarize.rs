use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{ChatMessage, LanguageModel};
use crate::prompt::{build_summary_prompt, SUMMARY_SYSTEM_PROMPT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    #[default]
    Concise,
    Detailed,
    KeyPoints,
}

impl SummaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryType::Concise => "concise",
            SummaryType::Detailed => "detailed",
            SummaryType::KeyPoints => "key_points",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            SummaryType::Concise => {
                "Provide a brief, high-level summary, focusing on the main purpose and key outcomes."
            }
            SummaryType::Detailed => {
                "Provide a detailed summary, covering all major sections and important provisions."
            }
            SummaryType::KeyPoints => {
                "Extract the most important key points and present them as a bulleted list."
            }
        }
    }
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "concise" => Ok(SummaryType::Concise),
            "detailed" => Ok(SummaryType::Detailed),
            "key_points" => Ok(SummaryType::KeyPoints),
            other => anyhow::bail!("Unsupported summary type \"{}\"", other),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub summary: String,
    #[serde(rename = "type")]
    pub summary_type: SummaryType,
}

pub struct Summarizer {
    llm: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn summarize(&self, text: &str, summary_type: SummaryType) -> Result<Summary> {
        let prompt = build_summary_prompt(summary_type.instruction(), text);
        let messages = [
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        let summary = self
            .llm
            .complete(&messages)
            .await
            .context("Failed to generate summary")?;

        debug!(summary_type = %summary_type, chars = summary.len(), "Generated summary");

        Ok(Summary {
            summary,
            summary_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingModel {
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            Ok("A short summary.".to_string())
        }
    }

    #[test]
    fn test_parse_summary_type() {
        assert_eq!("concise".parse::<SummaryType>().unwrap(), SummaryType::Concise);
        assert_eq!("detailed".parse::<SummaryType>().unwrap(), SummaryType::Detailed);
        assert_eq!("key_points".parse::<SummaryType>().unwrap(), SummaryType::KeyPoints);
        assert!("Concise".parse::<SummaryType>().is_err());
        assert!("bullet".parse::<SummaryType>().is_err());
    }

    #[tokio::test]
    async fn test_each_type_selects_its_instruction() {
        let model = Arc::new(RecordingModel::default());
        let summarizer = Summarizer::new(model.clone());

        for summary_type in [SummaryType::Concise, SummaryType::Detailed, SummaryType::KeyPoints] {
            let summary = summarizer.summarize("Lease agreement.", summary_type).await.unwrap();
            assert_eq!(summary.summary, "A short summary.");
            assert_eq!(summary.summary_type, summary_type);
        }

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0][0].role, Role::System);
        assert!(prompts[0][1].content.contains("brief, high-level summary"));
        assert!(prompts[1][1].content.contains("covering all major sections"));
        assert!(prompts[2][1].content.contains("bulleted list"));
        assert!(prompts[2][1].content.contains("Lease agreement."));
    }

    #[test]
    fn test_summary_serializes_type_key() {
        let summary = Summary {
            summary: "s".to_string(),
            summary_type: SummaryType::KeyPoints,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({"summary": "s", "type": "key_points"})
        );
    }
}
