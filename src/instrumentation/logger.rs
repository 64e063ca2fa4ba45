use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// One answered query, appended to `logs/queries.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLog {
    pub id: String,
    pub timestamp: String,
    pub query: String,
    pub category: String,
    pub latency_ms: u64,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub body_chars: u64,
    pub source_chars: u64,
    pub streamed: bool,
}

impl QueryLog {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    pub fn summary(&self) -> String {
        format!(
            "Category: {} | Latency: {:.1}s | Tokens: {} | Body: {} chars | Sources: {} chars",
            self.category,
            self.latency_ms as f64 / 1000.0,
            self.total_tokens(),
            self.body_chars,
            self.source_chars,
        )
    }
}

pub struct QueryLogger {
    dir: PathBuf,
}

impl QueryLogger {
    pub fn new(dir: &str) -> Result<Self> {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir).context("Failed to create logs directory")?;
        Ok(Self { dir })
    }

    pub fn write(&self, log: &QueryLog) -> Result<()> {
        let path = self.dir.join("queries.jsonl");
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        let json = serde_json::to_string(log).context("Failed to serialize query log")?;
        writeln!(file, "{}", json).context("Failed to write log")?;

        Ok(())
    }
}
