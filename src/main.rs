//! `deepsearch` command line: run one semantic search and print the results.

use deepsearch::{
    ClauseParser, DaemonConfig, FileNameBackend, HttpTranslator, MatchedItemMap,
    QueryTranslation, SearchBackend, SearchEvent, SemanticWorker,
};

use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Debug, Parser)]
#[command(name = "deepsearch", version, about = "Semantic desktop file search")]
struct Cli {
    /// Free-text query.
    query: String,

    /// Path to config.toml (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Skip semantic translation.
    #[arg(long)]
    no_semantic: bool,

    /// Skip the vector engine.
    #[arg(long)]
    no_vector: bool,

    /// Skip the full-text engine.
    #[arg(long)]
    no_fulltext: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "deepsearch=debug"
    } else {
        "deepsearch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DaemonConfig::load_or_default(cli.config.as_deref())?;

    let translator = HttpTranslator::new(&config.translator)
        .context("failed to build query-language client")?;
    let translation = QueryTranslation::new(Arc::new(translator), Arc::new(ClauseParser));
    let backends: Vec<Arc<dyn SearchBackend>> =
        vec![Arc::new(FileNameBackend::new(&config.filename))];

    let worker = Arc::new(SemanticWorker::new(
        "semantic",
        &config,
        translation,
        backends,
    ));
    worker.set_context(cli.query.as_str());
    worker.set_engine_state(
        config.engines.semantic && !cli.no_semantic,
        config.engines.vector && !cli.no_vector,
        config.engines.fulltext && !cli.no_fulltext,
    );

    let canceller = worker.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling search");
            canceller.terminate();
        }
    });

    let mut events = worker.subscribe();
    tokio::spawn(async move {
        while let Ok(SearchEvent::ResultsAvailable { categories, .. }) = events.recv().await {
            tracing::debug!(?categories, "results available");
        }
    });

    let completed = worker.run().await;
    let results = worker.take_all();

    if cli.json {
        let output = serde_json::json!({
            "completed": completed,
            "status": worker.status(),
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_results(&results);
    }

    if !completed {
        anyhow::bail!("search did not complete (status: {:?})", worker.status());
    }
    Ok(())
}

fn print_results(results: &MatchedItemMap) {
    for (category, entries) in results {
        println!("[{category}] {} result(s)", entries.len());
        for entry in entries {
            println!("  {:>6.1}  {}", entry.extra.weight(), entry.item);
        }
    }
}
