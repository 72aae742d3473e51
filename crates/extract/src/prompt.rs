pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are an expert legal assistant extracting information from contracts. Return only valid JSON.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a legal summarization expert.";

pub fn build_extraction_prompt(document_text: &str) -> String {
    format!(
        r#"You are an expert legal assistant. Extract the following information from the provided contract text and return it as a JSON object. If a field is not found, use null.

Expected JSON Schema:
{{
    "parties": [
        {{"name": "string", "role": "string"}}
    ],
    "effective_date": "YYYY-MM-DD or null",
    "termination_date": "YYYY-MM-DD or null",
    "governing_law": "string or null",
    "indemnification_clause": "string or null",
    "confidentiality_clause": "string or null",
    "key_terms": ["list of key terms"],
    "document_type": "string"
}}

Contract Text:
{}

Extracted Information (JSON):
"#,
        document_text
    )
}

pub fn build_summary_prompt(instruction: &str, document_text: &str) -> String {
    format!(
        r#"Summarize the following legal document. {}

Document Text:
{}

Summary:
"#,
        instruction, document_text
    )
}
