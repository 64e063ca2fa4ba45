use anyhow::{Context, Result};
use serde::Deserialize;

use crate::llm::{ChatClient, LlmResponse};
use crate::session::Profile;

const PERSONAL_PROMPT: &str = r#"Extract personal information and return ONLY a JSON object with this exact structure:
{
    "name": "patient name",
    "age": "numeric age",
    "location": "patient location"
}
Only include explicitly stated information. Leave fields empty if not mentioned.
Do not include any other text, explanation, or formatting."#;

const MEDICAL_PROMPT: &str = r#"Extract medical information and return ONLY a JSON object with this exact structure:
{
    "diagnosis": "patient diagnosis",
    "concern": "primary medical concern",
    "target": "treatment target or goal"
}
Only include explicitly stated information. Leave fields empty if not mentioned.
Do not include any other text, explanation, or formatting."#;

/// Which field set one intake message targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeMode {
    Personal,
    Medical,
}

impl IntakeMode {
    fn system_prompt(&self) -> &'static str {
        match self {
            IntakeMode::Personal => PERSONAL_PROMPT,
            IntakeMode::Medical => MEDICAL_PROMPT,
        }
    }
}

/// Fields as returned by one extraction call. Unknown keys in the reply are
/// ignored; the record shape is fixed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub concern: String,
    #[serde(default)]
    pub target: String,
}

impl From<ExtractedFields> for Profile {
    fn from(f: ExtractedFields) -> Self {
        Profile {
            name: f.name,
            age: f.age,
            location: f.location,
            diagnosis: f.diagnosis,
            concern: f.concern,
            target: f.target,
        }
    }
}

pub struct FieldExtractor {
    llm: ChatClient,
    model: String,
    max_tokens: u32,
}

impl FieldExtractor {
    pub fn new(llm: ChatClient, model: String, max_tokens: u32) -> Self {
        Self {
            llm,
            model,
            max_tokens,
        }
    }

    /// Extract the mode's three fields from one free-text message. Any
    /// failure propagates; the caller's record is untouched.
    pub async fn extract(
        &self,
        user_input: &str,
        mode: IntakeMode,
    ) -> Result<(Profile, LlmResponse)> {
        let response = self
            .llm
            .complete(
                &self.model,
                self.max_tokens,
                Some(mode.system_prompt()),
                user_input,
            )
            .await?;

        let fields = parse_fields(&response.text)
            .context("Extraction reply was not a JSON object")?;

        Ok((fields.into(), response))
    }
}

/// Parse the model's reply as a JSON object, tolerating prose around it by
/// scanning for the outermost brace pair.
fn parse_fields(text: &str) -> Result<ExtractedFields> {
    if let Ok(fields) = serde_json::from_str(text) {
        return Ok(fields);
    }

    let start = text
        .find('{')
        .context("No JSON object found in extraction reply")?;
    let end = text
        .rfind('}')
        .context("No closing brace found in extraction reply")?;

    serde_json::from_str(&text[start..=end]).context("Failed to parse extraction reply as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_object() {
        let fields =
            parse_fields(r#"{"name":"Jane","age":"50","location":"Boston"}"#).unwrap();
        assert_eq!(fields.name, "Jane");
        assert_eq!(fields.age, "50");
        assert_eq!(fields.location, "Boston");
        assert!(fields.diagnosis.is_empty());
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let reply = "Here is the extracted information:\n{\"diagnosis\":\"type 2 diabetes\",\"concern\":\"blood sugar\",\"target\":\"A1C control\"}\nLet me know if you need more.";
        let fields = parse_fields(reply).unwrap();
        assert_eq!(fields.diagnosis, "type 2 diabetes");
        assert_eq!(fields.target, "A1C control");
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let fields = parse_fields(r#"{"name":"Jane"}"#).unwrap();
        assert_eq!(fields.name, "Jane");
        assert!(fields.age.is_empty());
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let fields =
            parse_fields(r#"{"name":"Jane","mood":"hopeful","bmi":"27"}"#).unwrap();
        assert_eq!(fields.name, "Jane");
        assert!(fields.diagnosis.is_empty());
    }

    #[test]
    fn non_json_reply_is_an_error() {
        assert!(parse_fields("I could not find any information.").is_err());
    }

    #[test]
    fn unbalanced_braces_are_an_error() {
        assert!(parse_fields("{\"name\": \"Jane\"").is_err());
    }
}
