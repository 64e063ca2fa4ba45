mod assistant;
mod config;
mod instrumentation;
mod llm;
mod session;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};

use assistant::extractor::IntakeMode;
use assistant::Assistant;
use config::Config;
use session::{IntakeStep, SessionContext};

#[derive(Parser)]
#[command(
    name = "glp1-assist",
    about = "Personalized GLP-1 medication information assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose per-stage output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive intake and question loop
    Chat {
        /// Stream answers incrementally as they arrive
        #[arg(long)]
        stream: bool,
    },
    /// Answer one question against a profile built from two intake strings
    Ask {
        /// Free-text personal info (name, age, location)
        #[arg(long)]
        personal: String,
        /// Free-text medical info (diagnosis, concern, treatment target)
        #[arg(long)]
        medical: String,
        /// Stream the answer incrementally as it arrives
        #[arg(long)]
        stream: bool,
        /// The question to ask
        question: String,
    },
    /// Run every query in a JSONL file against one profile
    Batch {
        /// Free-text personal info (name, age, location)
        #[arg(long)]
        personal: String,
        /// Free-text medical info (diagnosis, concern, treatment target)
        #[arg(long)]
        medical: String,
        /// Path to JSONL file with {"query": ...} records
        path: String,
    },
}

#[derive(serde::Deserialize)]
struct BatchQuery {
    query: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let assistant = Assistant::new(&config)?;

    match cli.command {
        Commands::Chat { stream } => run_chat(&assistant, stream, cli.verbose).await,
        Commands::Ask {
            personal,
            medical,
            stream,
            question,
        } => run_ask(&assistant, &personal, &medical, &question, stream, cli.verbose).await,
        Commands::Batch {
            personal,
            medical,
            path,
        } => run_batch(&assistant, &personal, &medical, &path, cli.verbose).await,
    }
}

async fn run_chat(assistant: &Assistant, stream: bool, verbose: bool) -> Result<()> {
    let mut session = SessionContext::new();
    let stdin = std::io::stdin();

    println!("GLP-1 Medication Assistant");
    println!("Type 'quit' to exit, 'reset' to start over, 'profile' to show your profile.\n");

    loop {
        match session.step() {
            IntakeStep::PersonalInfo => print!("Enter your name, age, and location: "),
            IntakeStep::MedicalInfo => {
                print!("Enter your diagnosis, main concern, and treatment target: ")
            }
            IntakeStep::Complete => print!("Ask about GLP-1 medications: "),
        }
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input {
            "quit" | "exit" => break,
            "reset" => {
                session.reset();
                println!("Session cleared.\n");
                continue;
            }
            "profile" => {
                println!("\n{}\n", session.profile.render());
                continue;
            }
            _ => {}
        }

        match session.step() {
            IntakeStep::PersonalInfo => {
                if let Err(e) = assistant
                    .intake(&mut session, input, IntakeMode::Personal, verbose)
                    .await
                {
                    eprintln!("Error processing input: {e:#}");
                    continue;
                }
                let missing = session.profile.missing_personal();
                if !missing.is_empty() {
                    println!("Still missing: {}.\n", missing.join(", "));
                }
            }
            IntakeStep::MedicalInfo => {
                if let Err(e) = assistant
                    .intake(&mut session, input, IntakeMode::Medical, verbose)
                    .await
                {
                    eprintln!("Error processing input: {e:#}");
                    continue;
                }
                let missing = session.profile.missing_medical();
                if !missing.is_empty() {
                    println!("Still missing: {}.\n", missing.join(", "));
                } else {
                    println!("\nAnalyzing your profile...");
                    let analysis = assistant.analyze(&mut session, verbose).await;
                    println!("\n{}\n", analysis);
                }
            }
            IntakeStep::Complete => {
                answer_query(assistant, &mut session, input, stream, verbose).await;
            }
        }
    }

    Ok(())
}

/// Answer one in-session question. Upstream errors abort this query only,
/// never the loop.
async fn answer_query(
    assistant: &Assistant,
    session: &mut SessionContext,
    query: &str,
    stream: bool,
    verbose: bool,
) {
    let result = if stream {
        println!();
        assistant
            .ask(session, query, true, |delta| {
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            })
            .await
    } else {
        assistant.ask(session, query, false, |_| {}).await
    };

    match result {
        Ok((answer, category, log)) => {
            if stream {
                println!("\n");
            } else {
                println!("\n{}\n", answer.body);
            }
            println!("Sources: {}\n", answer.sources);
            if verbose {
                eprintln!("[{}] {}", category.as_str(), log.summary());
            }
        }
        Err(e) => eprintln!("Error answering question: {e:#}"),
    }
}

async fn run_ask(
    assistant: &Assistant,
    personal: &str,
    medical: &str,
    question: &str,
    stream: bool,
    verbose: bool,
) -> Result<()> {
    let mut session = build_session(assistant, personal, medical, verbose).await?;
    answer_query(assistant, &mut session, question, stream, verbose).await;
    Ok(())
}

async fn run_batch(
    assistant: &Assistant,
    personal: &str,
    medical: &str,
    path: &str,
    verbose: bool,
) -> Result<()> {
    let mut session = build_session(assistant, personal, medical, verbose).await?;

    let file =
        std::fs::File::open(path).context(format!("Failed to open batch file: {}", path))?;
    let reader = std::io::BufReader::new(file);

    let mut logs = Vec::new();
    let mut errors = 0;

    for (i, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }

        let bq: BatchQuery =
            serde_json::from_str(&line).context(format!("Failed to parse line {}", i + 1))?;

        eprintln!("\n[{}] {}", i + 1, bq.query);

        match assistant.ask(&mut session, &bq.query, false, |_| {}).await {
            Ok((answer, _, log)) => {
                println!("{}\n", answer.body);
                println!("Sources: {}", answer.sources);
                println!("  {}", log.summary());
                logs.push(log);
            }
            Err(e) => {
                eprintln!("  ERROR: {}", e);
                errors += 1;
            }
        }
    }

    if !logs.is_empty() {
        println!("\n=== Batch Summary ===");
        println!("Queries: {} (errors: {})", logs.len(), errors);

        let avg_latency =
            logs.iter().map(|l| l.latency_ms).sum::<u64>() as f64 / logs.len() as f64;
        let total_tokens: u32 = logs.iter().map(|l| l.total_tokens()).sum();

        println!("Avg latency: {:.1}s", avg_latency / 1000.0);
        println!("Total tokens: {}", total_tokens);
    }

    Ok(())
}

/// Build a one-shot session from two intake strings, then analyze it.
/// Missing fields are reported but do not block the question.
async fn build_session(
    assistant: &Assistant,
    personal: &str,
    medical: &str,
    verbose: bool,
) -> Result<SessionContext> {
    let mut session = SessionContext::new();

    assistant
        .intake(&mut session, personal, IntakeMode::Personal, verbose)
        .await?;
    assistant
        .intake(&mut session, medical, IntakeMode::Medical, verbose)
        .await?;

    let missing: Vec<&str> = session
        .profile
        .missing_personal()
        .into_iter()
        .chain(session.profile.missing_medical())
        .collect();
    if !missing.is_empty() {
        eprintln!("Profile incomplete (missing: {}).", missing.join(", "));
    }

    let analysis = assistant.analyze(&mut session, verbose).await;
    if verbose {
        eprintln!("[analyzer]\n{}\n", analysis);
    }

    Ok(session)
}
