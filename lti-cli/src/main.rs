//! LTI Outcomes CLI
//!
//! Read, replace and delete grades on a Tool Consumer's outcome service,
//! and check signatures of captured requests.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use lti_outcomes::{
    HttpConfig, InboundRequest, OutcomeAction, OutcomeRequest, OutcomeResult, Parameters, Score,
    SigningContext, ToolProvider,
};

#[derive(Parser)]
#[command(name = "lti-outcomes")]
#[command(author, version, about = "LTI Basic Outcomes: grade passback for Tool Providers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OAuth consumer key shared with the Tool Consumer
    #[arg(long, env = "LTI_CONSUMER_KEY", global = true, hide_env_values = true)]
    consumer_key: Option<String>,

    /// OAuth consumer secret shared with the Tool Consumer
    #[arg(long, env = "LTI_CONSUMER_SECRET", global = true, hide_env_values = true)]
    consumer_secret: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,
}

#[derive(Args)]
struct Target {
    /// Outcome service URL (lis_outcome_service_url)
    #[arg(long)]
    service_url: String,

    /// Result sourced ID (lis_result_sourcedid)
    #[arg(long)]
    sourced_id: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the current grade
    Read(Target),

    /// Replace the grade with a score between 0 and 1
    Replace {
        #[command(flatten)]
        target: Target,

        /// New score
        #[arg(long)]
        score: String,
    },

    /// Delete the grade
    Delete(Target),

    /// Print the XML body of an outcome request without sending it
    Body {
        /// Result sourced ID
        #[arg(long)]
        sourced_id: String,

        /// Action: read, replace or delete
        #[arg(long, default_value = "read")]
        action: String,

        /// Score for replace
        #[arg(long)]
        score: Option<String>,
    },

    /// Verify the OAuth signature of a captured request
    Verify {
        /// Request URL as received
        #[arg(long)]
        url: String,

        /// HTTP method
        #[arg(long, default_value = "POST")]
        method: String,

        /// Request parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let ctx = signing_context(&cli)?;
    let provider = ToolProvider::with_http(ctx, HttpConfig::default().with_timeout(cli.timeout))?;

    match cli.command {
        Commands::Read(target) => {
            let result = send(&provider, &target, OutcomeAction::Read, None).await?;
            report(&result)?;
        }
        Commands::Replace { target, score } => {
            let score = Score::parse(&score)?;
            let result = send(&provider, &target, OutcomeAction::Replace, Some(score)).await?;
            report(&result)?;
        }
        Commands::Delete(target) => {
            let result = send(&provider, &target, OutcomeAction::Delete, None).await?;
            report(&result)?;
        }
        Commands::Body {
            sourced_id,
            action,
            score,
        } => {
            let xml = provider.build_result_body(&sourced_id, &action, score.as_deref())?;
            println!("{}", xml);
        }
        Commands::Verify { url, method, params } => {
            let params: Parameters = params.into_iter().collect();
            let request = InboundRequest::new(url, method, params);
            if provider.verify(&request)? {
                println!("✅ Signature valid");
            } else {
                bail!("Signature does not match");
            }
        }
    }

    Ok(())
}

fn signing_context(cli: &Cli) -> Result<SigningContext> {
    let key = cli
        .consumer_key
        .clone()
        .context("Consumer key required. Set LTI_CONSUMER_KEY or use --consumer-key")?;
    let secret = cli
        .consumer_secret
        .clone()
        .context("Consumer secret required. Set LTI_CONSUMER_SECRET or use --consumer-secret")?;
    Ok(SigningContext::new(key, secret))
}

async fn send(
    provider: &ToolProvider,
    target: &Target,
    action: OutcomeAction,
    score: Option<Score>,
) -> Result<OutcomeResult> {
    let request = OutcomeRequest::new(target.sourced_id.as_str(), action, score)?;
    debug!("Sending {} to {}", action, target.service_url);
    Ok(provider.send(&target.service_url, &request).await?)
}

fn report(result: &OutcomeResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.success {
        bail!(
            "Consumer reported {}",
            result.code_major.as_deref().unwrap_or("no status")
        );
    }
    Ok(())
}
