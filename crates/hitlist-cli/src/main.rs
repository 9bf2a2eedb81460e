use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hitlist_adapters::{classify, company_name, identity_key};
use hitlist_core::{Ats, PriorityPolicy};
use hitlist_storage::SeenStore;
use hitlist_sync::{FilterEngine, FilterVerdict, Pipeline, PipelineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "hitlist-cli")]
#[command(about = "Score, dedup and prioritize job-search hits")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process every enabled catalog query once.
    Run,
    /// Show how the filter engine judges a single posting.
    Explain {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        url: Option<String>,
        /// Assumed posting age, for the priority preview.
        #[arg(long)]
        hours_old: Option<f64>,
    },
    /// Run on the configured cron schedule until interrupted.
    Watch,
    /// Print the size of the seen-set.
    Seen,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hitlist_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env().context("loading configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let summary = Pipeline::new(config)?.run_once().await?;
            println!(
                "run complete: run_id={} queries={} hits={} written={} duplicates={} stale={} reports={}",
                summary.run_id,
                summary.counts.queries,
                summary.counts.raw_hits,
                summary.counts.written,
                summary.counts.duplicates,
                summary.counts.stale,
                summary.reports_dir
            );
        }
        Commands::Explain {
            title,
            description,
            url,
            hours_old,
        } => {
            let pipeline = Pipeline::new(config)?;
            let engine = FilterEngine::new(pipeline.load_rules()?).context("compiling scoring rules")?;
            explain(&engine, &title, &description, url.as_deref(), hours_old);
        }
        Commands::Watch => {
            let mut config = config;
            config.scheduler_enabled = true;
            let cron = config.sync_cron.clone();
            let pipeline = Arc::new(Pipeline::new(config)?);
            let Some(mut sched) = pipeline.maybe_build_scheduler().await? else {
                anyhow::bail!("scheduler disabled");
            };
            sched.start().await.context("starting scheduler")?;
            tracing::info!(%cron, "watching; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
            sched.shutdown().await.context("stopping scheduler")?;
        }
        Commands::Seen => {
            let store = SeenStore::new(config.seen_jobs_file.clone());
            let seen = store.load().await?;
            println!("{} seen jobs in {}", seen.len(), store.path().display());
        }
    }

    Ok(())
}

fn explain(engine: &FilterEngine, title: &str, description: &str, url: Option<&str>, hours_old: Option<f64>) {
    let ats = url.map(classify).unwrap_or(Ats::Other);
    if let Some(url) = url {
        println!("identity: {}", identity_key(url));
        println!("ats:      {ats}");
        println!("company:  {}", company_name(url, title));
    }
    println!("senior:   {}", engine.is_senior(title));
    println!("us ok:    {}", engine.is_us_eligible(title, description));

    let fit = engine.assess_fit(title, description);
    println!("score:    {}", fit.score);
    println!("reasons:  {}", fit.reasons.join(", "));
    println!("keywords: {}", fit.matched_keywords.join(", "));

    match engine.evaluate(title, description) {
        FilterVerdict::Admitted(fit) => {
            let priority = PriorityPolicy::default().classify(fit.score, hours_old, ats);
            println!("verdict:  admitted (priority {priority})");
        }
        FilterVerdict::Rejected(reason) => println!("verdict:  rejected ({})", reason.as_str()),
    }
}
