use anyhow::Result;

use super::sources::{split_sources, StreamAssembler, NO_SOURCES_PLACEHOLDER};
use crate::llm::{ChatClient, LlmResponse};
use crate::session::Profile;

const SYSTEM_PROMPT: &str = r#"You are a medical information assistant specializing in GLP-1 medications. You receive a JSON document with the patient's profile, a prior medical analysis, and their question.

Guidelines:
- Answer the question directly and relate it to the patient's condition and treatment target
- Note relevant warnings and precautions
- Cite current medical guidelines found via web search
- End the reply with a line starting with "Sources:" listing the URLs you relied on, each preceded by a short description
- Include a brief medical disclaimer"#;

const DISCLAIMER: &str = "Disclaimer: This information is for educational purposes only and is not a substitute for professional medical advice. Always consult your healthcare provider.";

/// One completed answer: the displayed body and the formatted sources block.
#[derive(Debug, Clone)]
pub struct Answer {
    pub body: String,
    pub sources: String,
}

pub struct AnswerBot {
    llm: ChatClient,
    model: String,
    max_tokens: u32,
}

impl AnswerBot {
    pub fn new(llm: ChatClient, model: String, max_tokens: u32) -> Self {
        Self {
            llm,
            model,
            max_tokens,
        }
    }

    /// Single-response variant: one request, one JSON reply.
    pub async fn answer(
        &self,
        profile: &Profile,
        analysis: Option<&str>,
        query: &str,
    ) -> Result<(Answer, LlmResponse)> {
        let prompt = build_prompt(profile, analysis, query);
        let response = self
            .llm
            .complete(&self.model, self.max_tokens, Some(SYSTEM_PROMPT), &prompt)
            .await?;

        let (body, sources) = split_sources(&response.text);
        let body = ensure_disclaimer(body.trim());
        let sources = sources.trim();
        let sources = if sources.is_empty() {
            NO_SOURCES_PLACEHOLDER.to_string()
        } else {
            super::sources::linkify(sources)
        };

        Ok((Answer { body, sources }, response))
    }

    /// Streaming variant: incremental fragments are handed to `on_delta` in
    /// arrival order while the assembler routes them to body or sources.
    pub async fn answer_streaming(
        &self,
        profile: &Profile,
        analysis: Option<&str>,
        query: &str,
        mut on_delta: impl FnMut(&str),
    ) -> Result<Answer> {
        let prompt = build_prompt(profile, analysis, query);
        let mut assembler = StreamAssembler::new();

        self.llm
            .complete_streaming(
                &self.model,
                self.max_tokens,
                Some(SYSTEM_PROMPT),
                &prompt,
                |delta| {
                    let visible = assembler.push(delta);
                    if !visible.is_empty() {
                        on_delta(visible);
                    }
                },
            )
            .await?;

        let (body, sources) = assembler.finish();
        Ok(Answer {
            body: ensure_disclaimer(&body),
            sources,
        })
    }
}

/// The composite prompt is a JSON document so the upstream model sees the
/// profile and analysis as structured context rather than prose.
fn build_prompt(profile: &Profile, analysis: Option<&str>, query: &str) -> String {
    serde_json::json!({
        "patient_profile": profile,
        "medical_analysis": analysis.unwrap_or(""),
        "query": query,
    })
    .to_string()
}

/// Append the fixed disclaimer unless the reply already carries one.
fn ensure_disclaimer(body: &str) -> String {
    if body.to_lowercase().contains("disclaimer") {
        body.to_string()
    } else {
        format!("{}\n\n{}", body, DISCLAIMER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile {
            name: "Jane".into(),
            age: "50".into(),
            location: "Boston".into(),
            diagnosis: "type 2 diabetes".into(),
            concern: "blood sugar".into(),
            target: "A1C control".into(),
        }
    }

    #[test]
    fn prompt_embeds_profile_analysis_and_query() {
        let prompt = build_prompt(&profile(), Some("analysis text"), "What are side effects?");
        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(value["patient_profile"]["name"], "Jane");
        assert_eq!(value["patient_profile"]["diagnosis"], "type 2 diabetes");
        assert_eq!(value["medical_analysis"], "analysis text");
        assert_eq!(value["query"], "What are side effects?");
    }

    #[test]
    fn prompt_tolerates_missing_analysis() {
        let prompt = build_prompt(&profile(), None, "q");
        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(value["medical_analysis"], "");
    }

    #[test]
    fn disclaimer_appended_when_absent() {
        let body = ensure_disclaimer("Take with food.");
        assert!(body.ends_with(DISCLAIMER));
    }

    #[test]
    fn disclaimer_not_duplicated() {
        let upstream = "Take with food.\n\nDisclaimer: talk to your doctor.";
        assert_eq!(ensure_disclaimer(upstream), upstream);
    }

    #[test]
    fn disclaimer_check_is_case_insensitive() {
        let upstream = "Take with food. DISCLAIMER: see your doctor.";
        assert_eq!(ensure_disclaimer(upstream), upstream);
    }
}
