//! Extract command - pull statement fields from a single file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use mortex_core::{Document, Extractor};

use super::{classify, debug_text_from_env, load_config};

/// Exit status for a document type that is not accepted.
pub const UNSUPPORTED_EXIT_CODE: i32 = 2;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF, JPEG, or PNG)
    #[arg(required = true)]
    input: PathBuf,

    /// Declared content type (default: detected from the file)
    #[arg(short = 't', long)]
    content_type: Option<String>,

    /// Include a sample of the acquired text in the debug record (also EXTRACT_DEBUG=1)
    #[arg(long)]
    debug_text: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.debug_text || debug_text_from_env() {
        config.debug.include_text_sample = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let data = fs::read(&args.input)?;
    let doc_type = match classify(args.content_type.as_deref(), &data, &args.input) {
        Ok(doc_type) => doc_type,
        Err(rejection) => {
            println!("{}", serde_json::to_string(&rejection)?);
            std::process::exit(UNSUPPORTED_EXIT_CODE);
        }
    };

    info!("Processing {} as {}", args.input.display(), doc_type);

    let extractor = Extractor::new(&config);
    let document = Document::new(data, doc_type);
    let result = tokio::task::spawn_blocking(move || extractor.extract(&document)).await??;

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
