use std::process;

use findex::cli::Cli;
use findex::config::{RunConfig, TuningConfig};
use findex::error::Result;
use findex::pipeline;

fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    // Parse CLI arguments
    let cli = Cli::parse_args();

    let Some(docs_root) = cli.docs.clone() else {
        eprintln!(
            "Usage: findex --docs DOCS_PATH [--index INDEX_PATH] [--update] [--knn-dict DICT_PATH]"
        );
        eprintln!();
        eprintln!("Indexes the documents in DOCS_PATH, creating an index in INDEX_PATH.");
        eprintln!("If DICT_PATH contains a token-vector dictionary, the index will also");
        eprintln!("support vector search.");
        process::exit(1);
    };

    if let Err(err) = std::fs::metadata(&docs_root) {
        eprintln!(
            "Document directory '{}' does not exist or is not readable: {err}",
            docs_root.display()
        );
        process::exit(1);
    }

    let config = RunConfig {
        index_dir: cli.index.clone(),
        docs_root,
        dict_source: cli.knn_dict.clone(),
        mode: cli.write_mode(),
    };

    let stats = pipeline::run(&config, &TuningConfig::default())?;

    println!(
        "Indexed {} documents in {} ms",
        stats.doc_count, stats.elapsed_ms
    );

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("findex=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}
