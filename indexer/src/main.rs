use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use search_core::{
    process_queries, process_queries_joined, Document, DocumentId, DocumentStatus, ExecutionMode,
    SearchServer,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocumentId,
    text: String,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    ratings: Vec<i32>,
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    document_id: DocumentId,
    words: Vec<&'a str>,
    status: DocumentStatus,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Sequential,
    Parallel,
}

impl From<Mode> for ExecutionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sequential => ExecutionMode::Sequential,
            Mode::Parallel => ExecutionMode::Parallel,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Status {
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

impl From<Status> for DocumentStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Actual => DocumentStatus::Actual,
            Status::Irrelevant => DocumentStatus::Irrelevant,
            Status::Banned => DocumentStatus::Banned,
            Status::Removed => DocumentStatus::Removed,
        }
    }
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load a JSONL corpus into memory and query it with TF-IDF ranking", long_about = None)]
struct Cli {
    /// JSONL file with one {"id", "text", "status", "ratings"} object per line
    #[arg(long)]
    documents: String,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Execution mode for ranking, matching and removal. Sequential batches of
    /// several queries are spread over the thread pool one query per task
    #[arg(long, value_enum, default_value_t = Mode::Sequential)]
    mode: Mode,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top documents of each query, one JSON array per line
    Search {
        #[arg(required = true)]
        queries: Vec<String>,
        /// Only rank documents with this status
        #[arg(long, value_enum)]
        status: Option<Status>,
    },
    /// Print the results of all queries as one flattened JSON array
    Joined {
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Print which plus words of the query a document contains
    Match {
        query: String,
        #[arg(long)]
        id: DocumentId,
    },
    /// Remove a document, then run a query against what is left
    Remove {
        #[arg(long)]
        id: DocumentId,
        query: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut server = SearchServer::from_stop_words_text(&cli.stop_words)?;
    let loaded = load_documents(&mut server, Path::new(&cli.documents))?;
    tracing::info!(documents = loaded, path = %cli.documents, "corpus loaded");

    let mode = ExecutionMode::from(cli.mode);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Search { queries, status } => {
            let status = status.map(DocumentStatus::from).unwrap_or_default();
            let results = run_search(&server, &queries, status, mode)?;
            for documents in &results {
                writeln!(out, "{}", serde_json::to_string(documents)?)?;
            }
            tracing::info!(queries = queries.len(), "queries processed");
        }
        Commands::Joined { queries } => {
            let documents = process_queries_joined(&server, &queries)?;
            writeln!(out, "{}", serde_json::to_string(&documents)?)?;
        }
        Commands::Match { query, id } => {
            let (words, status) = server.match_document_with_mode(mode, &query, id)?;
            let output = MatchOutput { document_id: id, words, status };
            writeln!(out, "{}", serde_json::to_string(&output)?)?;
        }
        Commands::Remove { id, query } => {
            server.remove_document_with_mode(mode, id)?;
            tracing::info!(document_id = id, remaining = server.document_count(), "document removed");
            let documents = server.find_top_documents_with_mode(mode, &query, |_, s, _| {
                s == DocumentStatus::Actual
            })?;
            writeln!(out, "{}", serde_json::to_string(&documents)?)?;
        }
    }
    Ok(())
}

/// Top documents for each query. A sequential batch over the default status
/// fans out over the pool one query per task; any other combination ranks
/// the queries one after another with the requested mode and status.
fn run_search(
    server: &SearchServer,
    queries: &[String],
    status: DocumentStatus,
    mode: ExecutionMode,
) -> Result<Vec<Vec<Document>>> {
    if queries.len() > 1 && status == DocumentStatus::Actual && mode == ExecutionMode::Sequential {
        return Ok(process_queries(server, queries)?);
    }
    let results = queries
        .iter()
        .map(|q| server.find_top_documents_with_mode(mode, q, |_, s, _| s == status))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results)
}

/// Add every document of a JSONL file to `server`; blank lines are skipped.
fn load_documents(server: &mut SearchServer, file: &Path) -> Result<usize> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let mut loaded = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed document", file.display(), line_no + 1))?;
        server
            .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
            .with_context(|| format!("{}:{}: document {}", file.display(), line_no + 1, doc.id))?;
        loaded += 1;
    }
    Ok(loaded)
}
