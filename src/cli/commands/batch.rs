//! Batch linking of JAMS annotation directories.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::runtime::Runtime;

use crate::annotations::{JamsFile, find_jams};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::linking::{LinkEngine, MatchConfig, Provider};

use super::{MatchArgs, build_engine};

/// Output directory name used when `--output` isn't given
pub const DEFAULT_OUTPUT_DIR: &str = "jams_aligned";

/// Summary of a batch run, written by `--report`
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub started_at: String,
    pub input_dir: PathBuf,
    /// `None` in dry-run mode
    pub output_dir: Option<PathBuf>,
    pub processed: usize,
    pub linked: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Providers that produced a winning match
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Linked,
    Unmatched,
    Failed,
}

/// Link every annotation file in a directory
#[allow(clippy::too_many_arguments)]
pub fn cmd_batch(
    rt: &Runtime,
    config: &Config,
    dir: &PathBuf,
    output: Option<&PathBuf>,
    recursive: bool,
    dry_run: bool,
    report: Option<&PathBuf>,
    matching: &MatchArgs,
) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let output_dir = output
        .cloned()
        .unwrap_or_else(|| dir.join(DEFAULT_OUTPUT_DIR));
    // Earlier runs may have written into the input tree
    let files: Vec<PathBuf> = find_jams(dir, recursive)
        .into_iter()
        .filter(|p| !p.starts_with(&output_dir))
        .collect();

    if files.is_empty() {
        println!("No .jams files found in {}", dir.display());
        return Ok(());
    }

    println!("Linking {} annotation files...", files.len());
    if dry_run {
        println!("\n[DRY RUN MODE - No files will be written]\n");
    } else {
        println!("Output: {}\n", output_dir.display());
    }

    let engine = build_engine(config)?;
    let job = BatchJob {
        engine: &engine,
        match_config: matching.match_config(config),
        strict: matching.strict(config),
        input_dir: dir,
        output_dir: (!dry_run).then_some(output_dir),
    };
    let summary = rt.block_on(job.run(&files));

    println!();
    println!("=== Summary ===");
    println!("Processed: {}", summary.processed);
    println!("Linked:    {}", summary.linked);
    println!("Unmatched: {}", summary.unmatched);
    println!("Failed:    {}", summary.failed);

    if let Some(path) = report {
        write_report(&summary, path)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

/// One batch run over a fixed engine and configuration
struct BatchJob<'a> {
    engine: &'a LinkEngine,
    match_config: MatchConfig,
    strict: bool,
    input_dir: &'a Path,
    output_dir: Option<PathBuf>,
}

impl BatchJob<'_> {
    /// Link files one by one. A failing file is recorded and skipped.
    async fn run(&self, files: &[PathBuf]) -> BatchReport {
        let mut summary = BatchReport {
            started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            input_dir: self.input_dir.to_path_buf(),
            output_dir: self.output_dir.clone(),
            processed: 0,
            linked: 0,
            unmatched: 0,
            failed: 0,
            files: Vec::with_capacity(files.len()),
        };

        for (i, path) in files.iter().enumerate() {
            let name = path.strip_prefix(self.input_dir).unwrap_or(path);
            let file_report = match self.link_file(path).await {
                Ok(file_report) => {
                    let mark = if file_report.status == FileStatus::Linked { "✓" } else { "✗" };
                    let providers: Vec<&str> =
                        file_report.providers.iter().map(|p| p.as_str()).collect();
                    println!(
                        "[{}/{}] {} {} {}",
                        i + 1,
                        files.len(),
                        mark,
                        name.display(),
                        if providers.is_empty() {
                            "(no match)".to_string()
                        } else {
                            providers.join(", ")
                        }
                    );
                    file_report
                }
                Err(e) => {
                    tracing::warn!("Failed to link {:?}: {}", path, e);
                    eprintln!("[{}/{}] ERROR {}: {}", i + 1, files.len(), name.display(), e);
                    FileReport {
                        path: path.clone(),
                        status: FileStatus::Failed,
                        providers: Vec::new(),
                        output: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            summary.processed += 1;
            match file_report.status {
                FileStatus::Linked => summary.linked += 1,
                FileStatus::Unmatched => summary.unmatched += 1,
                FileStatus::Failed => summary.failed += 1,
            }
            summary.files.push(file_report);
        }

        summary
    }

    async fn link_file(&self, path: &Path) -> Result<FileReport> {
        let mut jams = JamsFile::read(path)?;
        let input = jams.input_record(self.strict)?;
        let record = self
            .engine
            .link(&input, &self.match_config)
            .await
            .map_err(|e| Error::from(e).context(format!("linking {}", path.display())))?;

        jams.apply(&record, Utc::now())?;

        let output = match &self.output_dir {
            Some(dir) => {
                let target = dir.join(self.relative_path(path)?);
                jams.write(&target)?;
                Some(target)
            }
            None => None,
        };

        Ok(FileReport {
            path: path.to_path_buf(),
            status: if record.is_linked() {
                FileStatus::Linked
            } else {
                FileStatus::Unmatched
            },
            providers: record.links.keys().copied().collect(),
            output,
            error: None,
        })
    }

    /// Path of `path` inside the output directory
    fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        if let Ok(relative) = path.strip_prefix(self.input_dir) {
            return Ok(relative.to_path_buf());
        }
        path.file_name()
            .map(PathBuf::from)
            .ok_or_else(|| Error::annotation(path, "path has no file name"))
    }
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(report)?;
    std::fs::write(path, text).map_err(|e| Error::from(e).context(format!("writing {}", path.display())))
}
