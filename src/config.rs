use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub pplx_api_key: String,
    pub openai_base_url: String,
    pub pplx_base_url: String,
    pub extractor_model: String,
    pub analyzer_model: String,
    pub answer_model: String,
    pub max_tokens: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            pplx_api_key: std::env::var("PPLX_API_KEY").context("PPLX_API_KEY must be set")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into()),
            pplx_base_url: std::env::var("PPLX_BASE_URL")
                .unwrap_or_else(|_| "https://api.perplexity.ai/chat/completions".into()),
            extractor_model: std::env::var("EXTRACTOR_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            analyzer_model: std::env::var("ANALYZER_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            answer_model: std::env::var("ANSWER_MODEL").unwrap_or_else(|_| "sonar".into()),
            max_tokens: std::env::var("MAX_TOKENS")
                .unwrap_or_else(|_| "1024".into())
                .parse()
                .context("MAX_TOKENS must be a number")?,
        })
    }
}
