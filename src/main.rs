mod analysis;
mod errors;
mod ingest;
mod llm_client;
mod normalize;
mod search;

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use analysis::{AnalysisReport, Analyst};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ingest::{
    FetchConfig, FormatReader, HttpApiFetcher, SharedApiFetcher, SourcePayload, UnsupportedFormat,
};
use llm_client::{build_llm_client_from_env, OpenAiLlmClient};
use search::{IndexName, IndexProvisioner, OpenSearchClient, SearchConfig, SharedSearchClient};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "insight-cortex",
    about = "Turn spreadsheets, documents and API payloads into LLM-ready analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a csv/xlsx/json/txt/pdf file and ask the model for a three-section analysis.
    Analyze {
        /// File to analyze; its suffix selects the parser.
        path: String,
        /// Question or instruction for the analysis.
        #[arg(short, long)]
        prompt: String,
    },
    /// GET an API endpoint, print the payload and optionally analyze it.
    Fetch {
        url: String,
        #[arg(short, long)]
        prompt: Option<String>,
    },
    /// Create the document index on the configured OpenSearch node unless it already exists.
    CreateIndex { name: String },
    /// Print the canonical text a file (or stdin) would contribute to a prompt.
    Normalize { path: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze { path, prompt } => run_analyze(&path, &prompt).await,
        Commands::Fetch { url, prompt } => run_fetch(&url, prompt.as_deref()).await,
        Commands::CreateIndex { name } => run_create_index(&name).await,
        Commands::Normalize { path } => run_normalize(path.as_deref()),
    };

    result.map_err(|err| {
        error!(?err, "Command failed");
        err
    })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}

fn load_payload(path: &str) -> anyhow::Result<SourcePayload> {
    let bytes = fs::read(Path::new(path)).with_context(|| format!("Failed to read file {path}"))?;
    let name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path);
    Ok(SourcePayload::new(name, bytes))
}

/// `Ok(None)` when no parser claims the file.
fn load_text(path: &str) -> anyhow::Result<Option<String>> {
    let payload = load_payload(path)?;
    FormatReader::from_env()
        .render_text(&payload)
        .with_context(|| format!("Failed to parse {path}"))
}

fn build_analyst() -> anyhow::Result<Analyst> {
    let llm = build_llm_client_from_env(true).context("LLM client initialization failed")?;
    let mut analyst = Analyst::new(llm);

    let companions: [(&str, &[&'static str]); 2] = [
        ("Agent", &["INSIGHT_AGENT_MODEL", "AIE_INSIGHT_AGENT_MODEL"]),
        (
            "Knowledge Base",
            &[
                "INSIGHT_KNOWLEDGE_BASE_MODEL",
                "AIE_INSIGHT_KNOWLEDGE_BASE_MODEL",
            ],
        ),
    ];
    for (label, vars) in companions {
        match OpenAiLlmClient::shared_companion_from_env(vars) {
            Ok(Some(client)) => {
                info!(companion = label, "companion model enabled");
                analyst = analyst.with_companion(label, client);
            }
            Ok(None) => {}
            Err(err) => warn!(?err, companion = label, "Skipping companion model"),
        }
    }

    Ok(analyst)
}

fn print_report(report: &AnalysisReport) {
    println!("### Response\n{}\n", report.response);
    for companion in &report.companions {
        println!("### {} Response\n{}\n", companion.label, companion.output);
    }
}

async fn run_analyze(path: &str, prompt: &str) -> anyhow::Result<()> {
    if prompt.trim().is_empty() {
        bail!("Please provide a prompt with --prompt");
    }

    let Some(text) = load_text(path)? else {
        println!("{}", UnsupportedFormat::MESSAGE);
        return Ok(());
    };

    let report = build_analyst()?.analyze(prompt, &text).await?;
    print_report(&report);
    Ok(())
}

async fn run_fetch(url: &str, prompt: Option<&str>) -> anyhow::Result<()> {
    let fetcher: SharedApiFetcher = HttpApiFetcher::shared(&FetchConfig::from_env())?;
    let payload = fetcher
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    println!("### API Data\n{}\n", payload.to_display());

    if let Some(prompt) = prompt.filter(|prompt| !prompt.trim().is_empty()) {
        let report = build_analyst()?.analyze(prompt, &payload.to_text()).await?;
        print_report(&report);
    }
    Ok(())
}

async fn run_create_index(name: &str) -> anyhow::Result<()> {
    let name = IndexName::new(name)?;
    let client: SharedSearchClient = Arc::new(OpenSearchClient::new(SearchConfig::from_env())?);

    let outcome = IndexProvisioner::new(client.as_ref())
        .ensure_index(&name)
        .await
        .with_context(|| format!("Failed to provision index {name}"))?;

    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
    Ok(())
}

fn run_normalize(path: Option<&str>) -> anyhow::Result<()> {
    let text = match path {
        Some(path) => match load_text(path)? {
            Some(text) => text,
            None => {
                println!("{}", UnsupportedFormat::MESSAGE);
                return Ok(());
            }
        },
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    println!("{}", normalize::normalize(&text));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn analyze_requires_path_and_prompt() {
        let cli = Cli::parse_from([
            "insight-cortex",
            "analyze",
            "sales.csv",
            "--prompt",
            "trend?",
        ]);
        match cli.command {
            Commands::Analyze { path, prompt } => {
                assert_eq!(path, "sales.csv");
                assert_eq!(prompt, "trend?");
            }
            other => panic!("unexpected command {other:?}"),
        }

        let err = Cli::try_parse_from(["insight-cortex", "analyze", "sales.csv"])
            .expect_err("prompt is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn fetch_prompt_is_optional() {
        let cli = Cli::parse_from(["insight-cortex", "fetch", "https://api.example.com/v1"]);
        assert!(matches!(
            cli.command,
            Commands::Fetch { ref url, prompt: None } if url == "https://api.example.com/v1"
        ));
    }

    #[test]
    fn create_index_and_normalize_parse() {
        let cli = Cli::parse_from(["insight-cortex", "create-index", "documents"]);
        assert!(matches!(cli.command, Commands::CreateIndex { ref name } if name == "documents"));

        let cli = Cli::parse_from(["insight-cortex", "normalize"]);
        assert!(matches!(cli.command, Commands::Normalize { path: None }));
    }

    #[test]
    fn cli_help_is_emitted_as_error_kind() {
        // Clap returns DisplayHelp as an error.
        let err = Cli::command()
            .try_get_matches_from(["insight-cortex", "--help"])
            .expect_err("help should short-circuit");
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn files_load_under_their_file_name() {
        let dir = std::env::temp_dir().join(format!("insight-cortex-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let file = dir.join("report.v2.csv");
        fs::write(&file, "Region,Sales\nNorth,10").expect("write fixture");
        let path = file.to_str().expect("utf-8 path");

        let payload = load_payload(path).expect("load");
        assert_eq!(payload.name, "report.v2.csv");

        let text = load_text(path).expect("parse");
        assert_eq!(text.as_deref(), Some("Region,Sales\nNorth,10"));

        let _ = fs::remove_dir_all(&dir);
    }
}
