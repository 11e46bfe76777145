//! Crosscheck CLI
//!
//! Multi-backend claim verification with cached consensus.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crosscheck_agents::{
    create_backend, create_gemini_backend, AggregatorConfig, ConsensusAggregator,
    EvidenceGatherer, Explainer, GathererConfig, GeminiConfig, LlmVerifier, OpenAIBackendConfig,
    Scout, SharedBackend, SharedVerdictBackend,
};
use crosscheck_core::{Claim, ClaimAnalysis, Credibility, Verdict, DEFAULT_CACHE_TTL_SECS};
use crosscheck_runtime::{Coordinator, CoordinatorConfig, MemoryBank, Metrics};
use crosscheck_search::{check_provider, BraveSearch, DuckDuckGo, SearchConfig, SharedProvider};

#[derive(Parser)]
#[command(name = "crosscheck")]
#[command(author, version, about = "Crosscheck: multi-backend claim verification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

/// API keys and model selection shared by the subcommands
#[derive(Args, Clone)]
struct BackendArgs {
    /// Gemini API key (or set GEMINI_API_KEY env var)
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_key: Option<String>,

    /// Groq API key (or set GROQ_API_KEY env var)
    #[arg(long, env = "GROQ_API_KEY")]
    groq_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: Option<String>,

    /// Brave Search API key (or set BRAVE_API_KEY env var)
    #[arg(long, env = "BRAVE_API_KEY")]
    brave_key: Option<String>,

    /// Gemini model
    #[arg(long, default_value = "gemini-2.0-flash")]
    gemini_model: String,

    /// Groq model
    #[arg(long, default_value = "llama-3.3-70b-versatile")]
    groq_model: String,

    /// OpenAI model
    #[arg(long, default_value = "gpt-4o-mini")]
    openai_model: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a claim
    Verify {
        /// The claim to verify
        #[arg(short, long)]
        claim: String,

        /// Optional URL where the claim was seen
        #[arg(long)]
        url: Option<String>,

        #[command(flatten)]
        backends: BackendArgs,

        /// Cache TTL in seconds (0 disables caching and dedup)
        #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
        ttl: u64,

        /// Overall analysis deadline in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,

        /// Write the analysis JSON to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Find verifiable claims trending around a topic
    Scout {
        /// The topic to scan
        #[arg(short, long)]
        topic: String,

        #[command(flatten)]
        backends: BackendArgs,
    },

    /// Check search provider and backend configuration
    Status {
        #[command(flatten)]
        backends: BackendArgs,
    },
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
        .compact()
        .init();

    match cli.command {
        Commands::Verify {
            claim,
            url,
            backends,
            ttl,
            timeout,
            json,
            output,
        } => {
            run_verify(&claim, url, &backends, ttl, timeout, json, output, cli.verbose).await?;
        }
        Commands::Scout { topic, backends } => {
            run_scout(&topic, &backends).await?;
        }
        Commands::Status { backends } => {
            run_status(&backends).await?;
        }
    }

    Ok(())
}

/// Build the search provider: Brave when a key is configured, else the
/// keyless DuckDuckGo endpoint
fn build_provider(args: &BackendArgs) -> Result<SharedProvider> {
    let config = SearchConfig::default();

    let provider: SharedProvider = match &args.brave_key {
        Some(key) => Arc::new(BraveSearch::new(key, &config)?),
        None => Arc::new(DuckDuckGo::new(&config)?),
    };

    Ok(provider)
}

/// Build every LLM backend with a configured key
fn build_llms(args: &BackendArgs) -> Result<Vec<SharedBackend>> {
    let mut llms: Vec<SharedBackend> = Vec::new();

    if let Some(key) = &args.gemini_key {
        llms.push(create_gemini_backend(GeminiConfig::new(key, &args.gemini_model))?);
    }
    if let Some(key) = &args.groq_key {
        llms.push(create_backend(OpenAIBackendConfig::groq(key, &args.groq_model))?);
    }
    if let Some(key) = &args.openai_key {
        llms.push(create_backend(OpenAIBackendConfig::openai(key, &args.openai_model))?);
    }

    if llms.is_empty() {
        anyhow::bail!(
            "No verdict backend configured. Set GEMINI_API_KEY, GROQ_API_KEY, or OPENAI_API_KEY."
        );
    }

    Ok(llms)
}

#[allow(clippy::too_many_arguments)]
async fn run_verify(
    claim_text: &str,
    url: Option<String>,
    backend_args: &BackendArgs,
    ttl: u64,
    timeout: u64,
    json: bool,
    output: Option<PathBuf>,
    verbose: u8,
) -> Result<()> {
    let claim = Claim::new(claim_text, url).map_err(|e| anyhow::anyhow!("Invalid claim: {}", e))?;

    let provider = build_provider(backend_args)?;
    let llms = build_llms(backend_args)?;

    let verdict_backends: Vec<SharedVerdictBackend> =
        llms.iter().map(|llm| LlmVerifier::shared(llm.clone())).collect();

    println!("🔍 Crosscheck - Multi-backend claim verification\n");
    println!("📋 Claim: {}", claim.text());
    println!(
        "🤖 Backends: {} | 🌐 Search: {}\n",
        llms.iter().map(|l| l.model_name()).collect::<Vec<_>>().join(", "),
        provider.name()
    );

    let coordinator = Coordinator::new(
        EvidenceGatherer::new(provider, GathererConfig::default()),
        ConsensusAggregator::new(verdict_backends, AggregatorConfig::default()),
        Explainer::new(llms[0].clone()),
        Arc::new(MemoryBank::new()),
        Arc::new(Metrics::new()),
        CoordinatorConfig {
            cache_ttl: Duration::from_secs(ttl),
            overall_timeout: Duration::from_secs(timeout),
        },
    );

    let started = Instant::now();
    let analysis = coordinator.analyze(&claim).await;
    let elapsed = started.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis, elapsed);
    }

    if let Some(path) = output {
        fs::write(&path, serde_json::to_string_pretty(&analysis)?)?;
        println!("\n📄 Analysis saved to: {}", path.display());
    }

    if verbose >= 2 {
        let stats = coordinator.memory().stats();
        println!(
            "\n📊 Cache: {} hits, {} misses, {} entries",
            stats.hits, stats.misses, stats.size
        );
        println!(
            "{}",
            serde_json::to_string_pretty(&coordinator.metrics().snapshot())?
        );
    }

    coordinator.memory().sweep();

    Ok(())
}

fn print_analysis(analysis: &ClaimAnalysis, elapsed: Duration) {
    let verdict_icon = match analysis.final_verdict {
        Verdict::True => "✅",
        Verdict::False => "❌",
        Verdict::Misleading => "⚠️",
        Verdict::Unverified => "❓",
    };

    println!(
        "{} Verdict: {} (confidence {:.0}%)",
        verdict_icon,
        analysis.final_verdict,
        analysis.confidence * 100.0
    );
    if analysis.cached {
        println!("⚡ Served from cache");
    }
    println!("⏱️  {:.1}s\n", elapsed.as_secs_f64());

    println!("{}\n", analysis.explanation);

    if !analysis.sources.is_empty() {
        println!("📚 Sources:");
        for source in &analysis.sources {
            println!(
                "   [{}] {} - {}",
                credibility_label(source.credibility),
                source.title,
                source.url
            );
        }
    }

    if !analysis.backend_verdicts.is_empty() {
        println!("\n🗳️  Backend verdicts:");
        for report in &analysis.backend_verdicts {
            println!(
                "   {} -> {} ({:.2}) [{:?}, {}ms]",
                report.backend, report.verdict, report.confidence, report.status, report.latency_ms
            );
        }
    }
}

fn credibility_label(credibility: Credibility) -> &'static str {
    match credibility {
        Credibility::High => "high",
        Credibility::Medium => "med",
        Credibility::Low => "low",
        Credibility::Unknown => "?",
    }
}

async fn run_scout(topic: &str, backend_args: &BackendArgs) -> Result<()> {
    let provider = build_provider(backend_args)?;
    let llms = build_llms(backend_args)?;

    println!("🔭 Scanning for verifiable claims: {}\n", topic);

    let scout = Scout::new(llms[0].clone(), provider);
    let claims = scout.scan(topic).await;

    if claims.is_empty() {
        println!("No verifiable claims found for this topic.");
        return Ok(());
    }

    for (i, claim) in claims.iter().enumerate() {
        println!("{}. {}", i + 1, claim);
    }
    println!("\nVerify one with: crosscheck verify -c \"<claim>\"");

    Ok(())
}

async fn run_status(backend_args: &BackendArgs) -> Result<()> {
    println!("🔌 Checking configuration...\n");

    match build_provider(backend_args) {
        Ok(provider) => {
            if check_provider(provider.as_ref()).await {
                println!("✅ Search provider '{}' is reachable", provider.name());
            } else {
                println!("❌ Search provider '{}' is not answering", provider.name());
            }
        }
        Err(e) => println!("❌ Search provider failed to build: {}", e),
    }

    let configured = [
        ("Gemini", backend_args.gemini_key.is_some(), &backend_args.gemini_model),
        ("Groq", backend_args.groq_key.is_some(), &backend_args.groq_model),
        ("OpenAI", backend_args.openai_key.is_some(), &backend_args.openai_model),
    ];

    println!("\n🤖 Verdict backends:");
    for (name, present, model) in configured {
        if present {
            println!("   ✅ {} ({})", name, model);
        } else {
            println!("   ➖ {} (no key)", name);
        }
    }

    let count = configured.iter().filter(|(_, present, _)| *present).count();
    if count == 0 {
        println!("\n⚠️  No verdict backends configured.");
        println!("   Set GEMINI_API_KEY, GROQ_API_KEY, or OPENAI_API_KEY.");
    } else if count == 1 {
        println!("\n⚠️  Single backend: consensus degrades to one vote.");
    }

    Ok(())
}
