// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use docs_rag::utils::logging::{format_info, format_success, format_warning};
use docs_rag::{
    BuildOptions, Config, DEFAULT_QUESTION, EmbeddingModel, IndexOrigin, IndexStore,
    OpenAiClient, OperationTimer, VectorIndex,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "docs_rag")]
#[command(version)]
#[command(about = "Query a folder of documents through a persisted vector index", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or load the index, then answer a question
    Query {
        /// Question text
        question: Option<String>,

        #[arg(short = 'k', long, value_name = "NUM")]
        top_k: Option<usize>,

        #[arg(long)]
        show_sources: bool,
    },

    /// Build the index from the data directory
    Build {
        /// Replace an existing index
        #[arg(long)]
        force: bool,
    },

    /// Show the closest chunks without calling the chat model
    Search {
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Show what the persisted index contains
    Stats,

    /// Delete the persisted index
    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    docs_rag::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let command = cli.command.unwrap_or(Commands::Query {
        question: None,
        top_k: None,
        show_sources: false,
    });

    match command {
        Commands::Query {
            question,
            top_k,
            show_sources,
        } => {
            cmd_query(
                &config,
                question.as_deref().unwrap_or(DEFAULT_QUESTION),
                top_k,
                show_sources,
                cli.color,
            )
            .await
        }
        Commands::Build { force } => cmd_build(&config, force, cli.color).await,
        Commands::Search { query, limit } => cmd_search(&config, &query, limit).await,
        Commands::Stats => cmd_stats(&config).await,
        Commands::Reset { confirm } => cmd_reset(&config, confirm),
    }
}

fn openai_client(config: &Config) -> Result<OpenAiClient> {
    let api_key = config.require_api_key()?;
    Ok(OpenAiClient::new(api_key, &config.openai)?)
}

fn build_options(config: &Config, colored: bool) -> BuildOptions {
    BuildOptions {
        embedding_batch_size: config.openai.embedding_batch_size,
        show_progress: true,
        colored,
    }
}

async fn cmd_query(
    config: &Config,
    question: &str,
    top_k: Option<usize>,
    show_sources: bool,
    colored: bool,
) -> Result<()> {
    let client = openai_client(config)?;

    let (index, origin) =
        VectorIndex::load_or_build(config, &client, &build_options(config, colored))
            .await
            .context("Failed to prepare the index")?;

    if origin == IndexOrigin::Built {
        eprintln!(
            "{}",
            format_success(&format!(
                "Index persisted to {}",
                config.storage.persist_dir.display()
            ))
        );
    }

    let top_k = top_k.unwrap_or(config.index.similarity_top_k);
    let engine = index.as_query_engine(&client, &client, top_k);

    info!("Query: {}", question);
    let timer = OperationTimer::new("query");
    let response = engine.query(question).await.context("Query failed")?;
    timer.warn_if_slow(Duration::from_secs(30), "answer synthesis");
    timer.finish();

    println!("{}", response);

    if show_sources {
        eprintln!();
        for (idx, source) in response.sources.iter().enumerate() {
            eprint!("{}. {}", idx + 1, source.format_summary(300));
        }
    }

    Ok(())
}

async fn cmd_build(config: &Config, force: bool, colored: bool) -> Result<()> {
    let persist_dir = &config.storage.persist_dir;

    if persist_dir.exists() && !force {
        eprintln!(
            "{}",
            format_warning(&format!(
                "{} already exists. Use --force to rebuild",
                persist_dir.display()
            ))
        );
        return Ok(());
    }

    let client = openai_client(config)?;
    let timer = OperationTimer::new("build index");
    let index = VectorIndex::rebuild(config, &client, &build_options(config, colored))
        .await
        .context("Index build failed; any existing index was kept")?;
    timer.finish();

    let manifest = index.manifest();
    eprintln!(
        "{}",
        format_success(&format!(
            "Indexed {} documents into {} chunks at {}",
            manifest.document_count,
            manifest.chunk_count,
            persist_dir.display()
        ))
    );

    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    let client = openai_client(config)?;
    let index = VectorIndex::load(&config.storage, client.model_name())
        .await
        .context("Failed to load the index")?;

    let embedding = client
        .embed_query(query)
        .await
        .context("Failed to embed the query")?;
    let results = index
        .store()
        .search(embedding, limit.max(1))
        .await
        .context("Vector search failed")?;

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("Found {} result(s)\n", results.len());
    println!("{}", "=".repeat(80));

    for (idx, result) in results.iter().enumerate() {
        println!("\n{}. {}", idx + 1, result.format_summary(300).trim_end());
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let store = IndexStore::open(&config.storage.persist_dir, &config.storage.table_name)
        .await
        .context("Failed to open the index")?;

    let manifest = store.manifest();
    let rows = store.count().await?;

    println!("Index:           {}", store.persist_dir().display());
    println!("Created:         {}", manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Embedding model: {} ({} dims)", manifest.embedding_model, manifest.dimensions);
    println!(
        "Chunking:        {} tokens, {} overlap",
        manifest.chunk_size, manifest.chunk_overlap
    );
    println!("Documents:       {}", manifest.document_count);
    println!("Chunks:          {} ({} rows)", manifest.chunk_count, rows);

    for doc in &manifest.documents {
        println!("  {:>4}  {}", doc.chunk_count, doc.relative_path);
    }

    if rows != manifest.chunk_count {
        eprintln!(
            "{}",
            format_warning("Row count differs from the manifest; consider rebuilding")
        );
    }

    Ok(())
}

fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    let persist_dir = &config.storage.persist_dir;

    if !confirm {
        eprintln!(
            "{}",
            format_warning(&format!(
                "This deletes {}. Use --confirm to proceed",
                persist_dir.display()
            ))
        );
        return Ok(());
    }

    if IndexStore::remove(persist_dir)? {
        eprintln!("{}", format_success("Index removed"));
    } else {
        eprintln!(
            "{}",
            format_info(&format!("Nothing to remove at {}", persist_dir.display()))
        );
    }

    Ok(())
}
