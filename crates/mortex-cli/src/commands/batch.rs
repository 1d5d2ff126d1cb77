//! Batch command - extract from many statements concurrently.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use mortex_core::{Document, ExtractionResult, Extractor, FieldName};

use super::{classify, debug_text_from_env, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory for one `<name>.json` per input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Number of documents processed at once
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Include a sample of the acquired text in each debug record
    #[arg(long)]
    debug_text: bool,
}

/// Outcome for a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.debug_text || debug_text_from_env() {
        config.debug.include_text_sample = true;
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // One blocking task per document, at most `jobs` at a time.
    let extractor = Arc::new(Extractor::new(&config));
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let extractor = Arc::clone(&extractor);
        let semaphore = Arc::clone(&semaphore);
        let pb = overall_pb.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            let file_start = Instant::now();
            let task_path = path.clone();
            let result =
                tokio::task::spawn_blocking(move || process_file(&extractor, &task_path)).await?;
            pb.inc(1);

            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            Ok::<_, anyhow::Error>(match result {
                Ok(result) => FileOutcome {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileOutcome {
                    path,
                    result: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            })
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await??);
    }

    overall_pb.finish_with_message("Complete");

    for outcome in &outcomes {
        if let Some(error_msg) = &outcome.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), error_msg);
                anyhow::bail!("Processing failed: {}: {}", outcome.path.display(), error_msg);
            }
        }
    }

    if let Some(output_dir) = &args.output_dir {
        let written: Vec<(&Path, &ExtractionResult)> = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().map(|r| (o.path.as_path(), r)))
            .collect();
        let paths: Vec<&Path> = written.iter().map(|(path, _)| *path).collect();

        for ((_, result), name) in written.iter().zip(output_names(&paths)) {
            let output_path = output_dir.join(name);
            fs::write(&output_path, serde_json::to_string_pretty(result)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(outcomes.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_file(extractor: &Extractor, path: &Path) -> anyhow::Result<ExtractionResult> {
    let data = fs::read(path)?;
    let doc_type = classify(None, &data, path)
        .map_err(|rejection| anyhow::anyhow!("{}", rejection))?;
    Ok(extractor.extract(&Document::new(data, doc_type))?)
}

fn output_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("statement")
}

/// One JSON file name per input: `<stem>.json`, or `<file name>.json` when
/// several inputs share a stem, numbered if whole names still collide.
fn output_names(paths: &[&Path]) -> Vec<String> {
    let mut stem_counts: HashMap<&str, usize> = HashMap::new();
    for path in paths {
        *stem_counts.entry(output_stem(path)).or_default() += 1;
    }

    let mut taken = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = output_stem(path);
            let base = if stem_counts.get(stem).copied().unwrap_or(0) > 1 {
                path.file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or(stem)
            } else {
                stem
            };

            let mut name = format!("{}.json", base);
            let mut suffix = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}-{}.json", base, suffix);
                suffix += 1;
            }
            if name != format!("{}.json", stem) {
                debug!("Writing {} as {}", path.display(), name);
            }
            name
        })
        .collect()
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(FieldName::ALL.iter().map(|f| f.as_str()));
    header.extend(["source", "processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let mut record = vec![filename.to_string()];
        match &outcome.result {
            Some(result) => {
                record.push("success".to_string());
                record.extend(result.fields.iter().map(|(_, f)| f.value.clone()));
                record.push(result.debug.text_stats.source.to_string());
            }
            None => {
                record.push("error".to_string());
                record.extend(std::iter::repeat_n(String::new(), FieldName::ALL.len() + 1));
            }
        }
        record.push(outcome.processing_time_ms.to_string());
        record.push(outcome.error.clone().unwrap_or_default());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
