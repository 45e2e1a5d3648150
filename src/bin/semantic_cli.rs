//! semantic-cli: similarity tables, projections and RAG scoring from the command line.
//!
//! Usage:
//!   semantic-cli ww <words-a> <words-b>          Words vs words
//!   semantic-cli wd <words> [--dataset <csv>]    Words vs dataset field
//!   semantic-cli wp <words> [--docs <dir>]       Words vs documents
//!   semantic-cli dd [--docs <dir>]               Documents vs documents
//!   semantic-cli reduce <words> [--method <m>]   PCA / t-SNE projection and plots
//!   semantic-cli w2v <words> [--vectors <file>]  Same, with local pretrained word vectors
//!   semantic-cli rag-eval <cases.json>           Answer and score question cases

use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use semantic_analysis::comparison::{ChunkType, ComparisonEngine, DirectoryCorpus, TextChunker};
use semantic_analysis::embeddings::{
    EmbeddingProvider, OpenAiEmbeddingClientBuilder, Word2VecProvider,
};
use semantic_analysis::io::{
    export_similarity_csv, extract_records_from_csv, load_records_json, resolve_word_input,
    save_records_json,
};
use semantic_analysis::pipeline::ProjectionPipeline;
use semantic_analysis::plot::PythonPlotRenderer;
use semantic_analysis::rag::{OpenAiChatGeneratorBuilder, RagCase, RagPipeline};
use semantic_analysis::reduction::ReductionMethod;
use semantic_analysis::store::{InMemoryVectorStore, PineconeClient, VectorStore};
use semantic_analysis::{AnalysisConfig, SimilarityPlotPoint};

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let rest = &args[2..];
    let result = match args[1].as_str() {
        "ww" => cmd_words_vs_words(rest, cancel).await,
        "wd" => cmd_words_vs_dataset(rest, cancel).await,
        "wp" => cmd_words_vs_documents(rest, cancel).await,
        "dd" => cmd_documents_vs_documents(rest, cancel).await,
        "reduce" => cmd_reduce(rest, cancel).await,
        "w2v" => cmd_word2vec(rest, cancel).await,
        "rag-eval" => cmd_rag_eval(rest, cancel).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"semantic-cli: semantic similarity analysis

USAGE:
    semantic-cli <COMMAND> [OPTIONS]

COMMANDS:
    ww <words-a> <words-b>              Compare two word lists
    wd <words> [--dataset <csv>]        Compare words with a dataset field
       [--label <attr>] [--field <attr>] [--rows <n>]
    wp <words> [--docs <dir>]           Compare words with each document
       [--chunk paragraph|sentence|none]
    dd [--docs <dir>]                   Compare every pair of documents
    reduce <words> [--method pca|tsne|all] [--no-plot]
                                        Project words to 2-D and plot them
    w2v <words> [--vectors <file>] [--method pca|tsne|all] [--no-plot]
                                        Project with pretrained word vectors
    rag-eval <cases.json> [--docs <dir>]
                                        Answer question cases and score them
    version                             Show version information
    help                                Show this help message

WORDS:
    A comma-separated list ("cat,dog,car") or a .txt file name looked up in
    the configured words directory.

OPTIONS:
    --config <path>                     YAML configuration file
    --out <path>                        Output CSV (comparison commands)

ENVIRONMENT:
    OPENAI_API_KEY                      API key for embeddings and chat
    SEMANTIC_CONFIG                     Configuration file path
    SEMANTIC_OUTPUT_DIR                 Root for CSV, JSON and plot outputs
    RUST_LOG                            Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!(
        "semantic-cli {} (semantic-analysis {})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_VERSION"),
    );
}

/// Value following `--name`, if present.
fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    const BOOLEAN_FLAGS: [&str; 1] = ["--no-plot"];
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = !BOOLEAN_FLAGS.contains(&arg.as_str());
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn load_config(args: &[String]) -> anyhow::Result<AnalysisConfig> {
    let config = AnalysisConfig::load(flag_value(args, "--config").map(Path::new))
        .context("loading configuration")?;
    config.validate()?;
    Ok(config)
}

fn embedding_provider(config: &AnalysisConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let client = OpenAiEmbeddingClientBuilder::from_config(&config.embedding)
        .build()
        .context("creating embedding client")?;
    Ok(Arc::new(client))
}

fn words_arg(args: &[String], index: usize, config: &AnalysisConfig) -> anyhow::Result<Vec<String>> {
    let Some(input) = positional(args).get(index).copied() else {
        bail!("missing word list argument #{}", index + 1);
    };
    Ok(resolve_word_input(input, &config.paths.words_dir)?)
}

fn docs_dir(args: &[String], config: &AnalysisConfig) -> PathBuf {
    flag_value(args, "--docs")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.paths.documents_dir.clone())
}

fn chunker(args: &[String]) -> anyhow::Result<TextChunker> {
    let chunk_type = match flag_value(args, "--chunk") {
        Some(s) => s.parse::<ChunkType>()?,
        None => ChunkType::default(),
    };
    Ok(TextChunker::new(chunk_type))
}

fn write_table(
    points: &[SimilarityPlotPoint],
    args: &[String],
    config: &AnalysisConfig,
    default_name: &str,
) -> anyhow::Result<()> {
    let path = flag_value(args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.paths.output_csv_dir.join(default_name));
    export_similarity_csv(points, &path)?;

    for point in points {
        match point.best_match() {
            Some((key, score)) => println!("{:<40} best: {} ({:.4})", point.label, key, score),
            None => println!("{:<40} (no scores)", point.label),
        }
    }
    println!("\nSaved {} rows to {}", points.len(), path.display());
    Ok(())
}

async fn cmd_words_vs_words(args: &[String], cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let a = words_arg(args, 0, &config)?;
    let b = words_arg(args, 1, &config)?;
    let engine = ComparisonEngine::new(embedding_provider(&config)?).with_cancellation(cancel);
    let points = engine.compare_words_vs_words(&a, &b).await?;
    write_table(&points, args, &config, "words_vs_words.csv")
}

async fn cmd_words_vs_dataset(args: &[String], cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let words = words_arg(args, 0, &config)?;
    let dataset = flag_value(args, "--dataset").unwrap_or(&config.paths.default_dataset);
    let label = flag_value(args, "--label").unwrap_or("Series_Title");
    let field = flag_value(args, "--field").unwrap_or("Overview");
    let rows = flag_value(args, "--rows")
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("--rows must be a non-negative integer")?;

    let engine = ComparisonEngine::new(embedding_provider(&config)?).with_cancellation(cancel);
    let dataset_path = config.paths.datasets_dir.join(dataset);
    let stem = Path::new(dataset)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| dataset.to_string());
    let json_path = config
        .paths
        .output_json_dir
        .join(format!("{}_embeddings.json", stem));

    let records = if json_path.is_file() {
        tracing::info!(path = %json_path.display(), "using cached dataset embeddings");
        load_records_json(&json_path).await?
    } else {
        let fields = vec![label.to_string(), field.to_string()];
        let mut records = extract_records_from_csv(&dataset_path, &fields, rows)?;
        engine.embed_dataset(&mut records, &[field.to_string()]).await?;
        save_records_json(&records, &json_path).await?;
        records
    };

    let points = engine
        .compare_dataset_vs_words(&records, label, field, &words)
        .await?;
    write_table(&points, args, &config, &format!("{}_vs_words.csv", stem))
}

async fn cmd_words_vs_documents(args: &[String], cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let words = words_arg(args, 0, &config)?;
    let corpus = DirectoryCorpus::new(docs_dir(args, &config));
    let engine = ComparisonEngine::new(embedding_provider(&config)?)
        .with_chunker(chunker(args)?)
        .with_cancellation(cancel);
    let points = engine.compare_documents_vs_words(&words, &corpus).await?;
    write_table(&points, args, &config, "documents_vs_words.csv")
}

async fn cmd_documents_vs_documents(
    args: &[String],
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let corpus = DirectoryCorpus::new(docs_dir(args, &config));
    let engine = ComparisonEngine::new(embedding_provider(&config)?)
        .with_chunker(chunker(args)?)
        .with_cancellation(cancel);
    let points = engine.compare_corpus(&corpus).await?;
    write_table(&points, args, &config, "documents_vs_documents.csv")
}

async fn cmd_reduce(args: &[String], cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let inputs = words_arg(args, 0, &config)?;
    let projection = ProjectionPipeline::from_config(embedding_provider(&config)?, &config)
        .with_cancellation(cancel);
    run_projection(projection, &inputs, args, &config).await
}

async fn cmd_word2vec(args: &[String], cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let inputs = words_arg(args, 0, &config)?;
    let path = flag_value(args, "--vectors")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.paths.word_vectors.clone());
    let provider = Word2VecProvider::from_path(&path)
        .await
        .with_context(|| format!("loading word vectors from {}", path.display()))?;

    let known = provider.known_inputs(&inputs);
    if known.is_empty() {
        println!("None of the {} inputs has a word vector, nothing to project", inputs.len());
        return Ok(());
    }
    let projection = ProjectionPipeline::from_config(Arc::new(provider), &config)
        .with_prefix("word2vec")
        .with_cancellation(cancel);
    run_projection(projection, &known, args, &config).await
}

async fn run_projection(
    mut projection: ProjectionPipeline,
    inputs: &[String],
    args: &[String],
    config: &AnalysisConfig,
) -> anyhow::Result<()> {
    let methods = match flag_value(args, "--method") {
        None | Some("all") => ReductionMethod::ALL.to_vec(),
        Some(m) => vec![m.parse::<ReductionMethod>()?],
    };
    if !has_flag(args, "--no-plot") {
        projection = projection.with_renderer(Arc::new(PythonPlotRenderer::from_config(&config.plot)));
    }

    for output in projection.run(inputs, &methods).await? {
        let status = if output.reused { "reused" } else { "computed" };
        println!("{:<5} {} ({})", output.method, output.csv_path.display(), status);
        if let Some(plot) = output.plot_path {
            println!("      {}", plot.display());
        }
    }
    Ok(())
}

async fn cmd_rag_eval(args: &[String], cancel: CancellationToken) -> anyhow::Result<()> {
    let config = load_config(args)?;
    let Some(cases_path) = positional(args).first().copied() else {
        bail!("missing cases file argument");
    };
    let text = tokio::fs::read_to_string(cases_path)
        .await
        .with_context(|| format!("reading {}", cases_path))?;
    let cases: Vec<RagCase> = serde_json::from_str(&text).context("parsing cases")?;

    let store: Arc<dyn VectorStore> = match &config.store.index_host {
        Some(host) => Arc::new(PineconeClient::builder().index_host(host.clone()).build()?),
        None => Arc::new(InMemoryVectorStore::new()),
    };
    let generator = OpenAiChatGeneratorBuilder::from_config(&config.chat).build()?;
    let rag = RagPipeline::new(embedding_provider(&config)?, store, Arc::new(generator))
        .with_namespace(config.store.namespace.clone())
        .with_top_k(config.store.top_k)
        .with_cancellation(cancel);

    let corpus = DirectoryCorpus::new(docs_dir(args, &config));
    rag.index_corpus(&corpus, &chunker(args)?).await?;

    let results = rag.run_cases(&cases).await?;
    for result in &results {
        println!(
            "{}\n  cosine {:.4}  rouge-1 {:.4}  rouge-2 {:.4}",
            result.query,
            result.scores.cosine_similarity,
            result.scores.rouge1,
            result.scores.rouge2
        );
    }

    let out = config.paths.output_json_dir.join("rag_evaluation.json");
    if let Some(parent) = out.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&out, serde_json::to_string_pretty(&results)?).await?;
    println!("\nSaved {} results to {}", results.len(), out.display());
    Ok(())
}
