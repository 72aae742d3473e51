use serde_json::{Map, Value};

const NDA_TEMPLATE: &str = r#"NON-DISCLOSURE AGREEMENT

This Non-Disclosure Agreement ("Agreement") is made and entered into as of {effective_date}, by and between {party_a_name} ("Disclosing Party") and {party_b_name} ("Receiving Party").

WHEREAS, the Disclosing Party possesses certain confidential and proprietary information relating to {confidential_info_description};

NOW, THEREFORE, in consideration of the mutual covenants and agreements contained herein, the parties agree as follows:

1. **Confidential Information.** "Confidential Information" shall mean any and all information disclosed by the Disclosing Party to the Receiving Party, whether orally, visually, or in writing, that is designated as confidential or that reasonably should be understood to be confidential given the nature of the information and the circumstances of disclosure.

2. **Obligations of Receiving Party.** The Receiving Party agrees to use the Confidential Information solely for the purpose of {purpose_of_disclosure} and to protect such information from unauthorized use or disclosure.

3. **Term.** This Agreement shall remain in effect for a period of {term_duration} from the Effective Date.

IN WITNESS WHEREOF, the parties have executed this Agreement as of the Effective Date.

_____________________________
{party_a_name}

_____________________________
{party_b_name}"#;

const NDA_FIELDS: &[&str] = &[
    "effective_date",
    "party_a_name",
    "party_b_name",
    "confidential_info_description",
    "purpose_of_disclosure",
    "term_duration",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTemplate {
    Nda,
}

impl DocumentTemplate {
    /// Case-insensitive lookup; `None` for types without a template
    pub fn from_type(document_type: &str) -> Option<Self> {
        match document_type.to_lowercase().as_str() {
            "nda" => Some(DocumentTemplate::Nda),
            _ => None,
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            DocumentTemplate::Nda => NDA_FIELDS,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            DocumentTemplate::Nda => NDA_TEMPLATE,
        }
    }

    /// Fill every `{field}` slot in one pass. Missing or null parameters become
    /// `[FIELD]`; substituted values are never re-scanned.
    pub fn render(&self, parameters: &Map<String, Value>) -> String {
        let body = self.body();
        let mut out = String::with_capacity(body.len());
        let mut rest = body;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find('}') {
                Some(close) if self.fields().contains(&&after[..close]) => {
                    out.push_str(&field_value(parameters, &after[..close]));
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

fn field_value(parameters: &Map<String, Value>, field: &str) -> String {
    match parameters.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => format!("[{}]", field.to_uppercase()),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_type_lookup_is_case_insensitive() {
        assert_eq!(DocumentTemplate::from_type("nda"), Some(DocumentTemplate::Nda));
        assert_eq!(DocumentTemplate::from_type("NDA"), Some(DocumentTemplate::Nda));
        assert_eq!(DocumentTemplate::from_type("not-a-type"), None);
        assert_eq!(DocumentTemplate::from_type(""), None);
    }

    #[test]
    fn test_no_parameters_leaves_all_placeholders() {
        let draft = DocumentTemplate::Nda.render(&Map::new());

        for token in [
            "[EFFECTIVE_DATE]",
            "[PARTY_A_NAME]",
            "[PARTY_B_NAME]",
            "[CONFIDENTIAL_INFO_DESCRIPTION]",
            "[PURPOSE_OF_DISCLOSURE]",
            "[TERM_DURATION]",
        ] {
            assert!(draft.contains(token), "missing {}", token);
        }
        assert!(!draft.contains('{'));
        assert_eq!(draft.matches("[PARTY_A_NAME]").count(), 2);
    }

    #[test]
    fn test_parameters_fill_their_slots() {
        let draft = DocumentTemplate::Nda.render(&params(json!({
            "effective_date": "2024-03-01",
            "party_a_name": "Acme Corp",
            "term_duration": 2,
            "purpose_of_disclosure": null,
            "unused": "ignored"
        })));

        assert!(draft.contains("as of 2024-03-01, by and between Acme Corp (\"Disclosing Party\")"));
        assert!(draft.contains("for a period of 2 from the Effective Date"));
        assert!(draft.contains("[PURPOSE_OF_DISCLOSURE]"));
        assert!(draft.contains("[PARTY_B_NAME]"));
        assert!(!draft.contains("ignored"));
        assert!(draft.ends_with("[PARTY_B_NAME]"));
    }

    #[test]
    fn test_values_are_not_re_expanded() {
        let draft = DocumentTemplate::Nda.render(&params(json!({
            "party_a_name": "{party_b_name}"
        })));

        assert!(draft.contains("between {party_b_name} (\"Disclosing Party\")"));
    }
}
