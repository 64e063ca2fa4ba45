pub mod analyzer;
pub mod answerer;
pub mod categorizer;
pub mod extractor;
pub mod sources;

use anyhow::Result;
use std::time::Instant;

use crate::config::Config;
use crate::instrumentation::{QueryLog, QueryLogger};
use crate::llm::ChatClient;
use crate::session::{ChatEntry, SessionContext};

use analyzer::ProfileAnalyzer;
use answerer::{Answer, AnswerBot};
use categorizer::{categorize, Category};
use extractor::{FieldExtractor, IntakeMode};

/// Orchestrates the pipeline: intake extraction, profile analysis, and the
/// web-augmented answer stage, with per-query logging.
pub struct Assistant {
    extractor: FieldExtractor,
    analyzer: ProfileAnalyzer,
    bot: AnswerBot,
    logger: QueryLogger,
}

impl Assistant {
    pub fn new(config: &Config) -> Result<Self> {
        let openai = ChatClient::new(&config.openai_api_key, &config.openai_base_url);
        let pplx = ChatClient::new(&config.pplx_api_key, &config.pplx_base_url);
        let logger = QueryLogger::new("logs")?;

        Ok(Self {
            extractor: FieldExtractor::new(
                openai.clone(),
                config.extractor_model.clone(),
                config.max_tokens,
            ),
            analyzer: ProfileAnalyzer::new(
                openai,
                config.analyzer_model.clone(),
                config.max_tokens,
            ),
            bot: AnswerBot::new(pplx, config.answer_model.clone(), config.max_tokens),
            logger,
        })
    }

    /// Run one intake message through the extractor and merge the result
    /// into the session. On failure the session is untouched.
    pub async fn intake(
        &self,
        session: &mut SessionContext,
        text: &str,
        mode: IntakeMode,
        verbose: bool,
    ) -> Result<()> {
        let start = Instant::now();
        let (fields, response) = self.extractor.extract(text, mode).await?;
        let latency = start.elapsed().as_millis() as u64;

        if verbose {
            eprintln!(
                "[extractor] {:?} fields in {}ms ({} in / {} out tokens)",
                mode, latency, response.input_tokens, response.output_tokens
            );
        }
        tracing::debug!(?mode, latency_ms = latency, "Intake extraction complete");

        session.merge_fields(&fields);
        Ok(())
    }

    /// Produce and attach the profile analysis. Failures inside the analyzer
    /// degrade to its sentinel text, so this never fails the session.
    pub async fn analyze(&self, session: &mut SessionContext, verbose: bool) -> String {
        let start = Instant::now();
        let analysis = self.analyzer.analyze(&session.profile).await;
        if verbose {
            eprintln!(
                "[analyzer] analysis in {}ms",
                start.elapsed().as_millis()
            );
        }
        session.set_analysis(analysis.clone());
        analysis
    }

    /// Answer one free-text question against the session's profile and
    /// analysis, record it in the history, and append a query log entry.
    ///
    /// With `stream` set, incremental fragments go to `on_delta` as they
    /// arrive; otherwise `on_delta` is never called.
    pub async fn ask(
        &self,
        session: &mut SessionContext,
        query: &str,
        stream: bool,
        on_delta: impl FnMut(&str),
    ) -> Result<(Answer, Category, QueryLog)> {
        let category = categorize(query);
        let start = Instant::now();

        let (answer, input_tokens, output_tokens) = if stream {
            let answer = self
                .bot
                .answer_streaming(
                    &session.profile,
                    session.analysis.as_deref(),
                    query,
                    on_delta,
                )
                .await?;
            // Usage is not reported on the streaming path.
            (answer, 0, 0)
        } else {
            let (answer, response) = self
                .bot
                .answer(&session.profile, session.analysis.as_deref(), query)
                .await?;
            (answer, response.input_tokens, response.output_tokens)
        };

        let log = QueryLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            query: query.to_string(),
            category: category.as_str().to_string(),
            latency_ms: start.elapsed().as_millis() as u64,
            input_tokens,
            output_tokens,
            body_chars: answer.body.len() as u64,
            source_chars: answer.sources.len() as u64,
            streamed: stream,
        };

        if let Err(e) = self.logger.write(&log) {
            tracing::warn!(error = %e, "Failed to write query log");
        }

        session.record(ChatEntry {
            query: query.to_string(),
            body: answer.body.clone(),
            sources: answer.sources.clone(),
            category: category.as_str().to_string(),
        });

        Ok((answer, category, log))
    }
}
