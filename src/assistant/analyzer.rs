use crate::llm::ChatClient;
use crate::session::Profile;

const SYSTEM_PROMPT: &str = "You are a medical profile analyzer.";

const ANALYSIS_PROMPT: &str = r#"Analyze the patient profile above. Cover:
- age-related considerations and diagnosis-specific concerns
- relevance of GLP-1 therapy to the stated condition and treatment target
- monitoring needs and lifestyle factors
- potential drug interactions and precautions

Write plain prose, not JSON."#;

/// Returned in place of an analysis when the upstream call fails. The intake
/// flow continues; answers simply lack the analysis context.
pub const ANALYSIS_UNAVAILABLE: &str =
    "Profile analysis is currently unavailable. Answers will be based on your profile alone.";

pub struct ProfileAnalyzer {
    llm: ChatClient,
    model: String,
    max_tokens: u32,
}

impl ProfileAnalyzer {
    pub fn new(llm: ChatClient, model: String, max_tokens: u32) -> Self {
        Self {
            llm,
            model,
            max_tokens,
        }
    }

    /// Produce narrative commentary on a completed profile. The raw reply is
    /// returned unmodified; on failure the fixed sentinel takes its place.
    pub async fn analyze(&self, profile: &Profile) -> String {
        let user_message = format!("Patient Profile:\n{}\n\n{}", profile.render(), ANALYSIS_PROMPT);

        match self
            .llm
            .complete(&self.model, self.max_tokens, Some(SYSTEM_PROMPT), &user_message)
            .await
        {
            Ok(response) => response.text,
            Err(e) => {
                tracing::warn!(error = %e, "Profile analysis failed");
                ANALYSIS_UNAVAILABLE.to_string()
            }
        }
    }
}
