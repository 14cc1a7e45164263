use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::batch::batched;
use crate::config::OUTPUT_TIMESTAMP_FMT;
use crate::error::ScrapeError;
use crate::fetch::Fetch;
use crate::pipeline::scrape;
use crate::query::ChainQuery;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

impl Format {
    pub fn ext(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }
}

/// Totals returned after a run completes.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub batches: usize,
    pub records: usize,
}

/// Writes one file per batch of records under `{root}/{TICKER}/`.
pub struct BatchSerializer {
    ticker: String,
    output_path: PathBuf,
    format: Format,
    batch_size: usize,
}

impl BatchSerializer {
    /// Validates the arguments and ensures the ticker directory exists.
    /// No network activity happens here, so configuration errors surface
    /// before the first request.
    pub fn new(ticker: &str, root_dir: &Path, format: Format, batch_size: usize) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(ScrapeError::MissingTicker.into());
        }
        if batch_size == 0 {
            return Err(ScrapeError::InvalidBatchSize.into());
        }
        check_output_dir(root_dir)?;

        let output_path = root_dir.join(&ticker);
        ensure_directory(&output_path)?;

        Ok(BatchSerializer {
            ticker,
            output_path,
            format,
            batch_size,
        })
    }

    /// Drain the record stream for this ticker, writing each batch as it fills.
    pub fn serialize<F: Fetch>(
        &self,
        fetcher: &F,
        base_url: &str,
        query: &ChainQuery,
    ) -> Result<RunSummary> {
        let stream = scrape(fetcher, base_url, &self.ticker, query)?;
        info!("Seed URL {}", stream.seed_url());

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} records {msg}")?,
        );

        let mut summary = RunSummary::default();
        for batch in batched(stream, self.batch_size) {
            let items = batch.into_iter().collect::<Result<Vec<Record>>>()?;

            let path = self.next_file_path(summary.batches + 1);
            self.write_batch(&items, &path)?;
            info!("Scraped batch {} records -> {}", items.len(), path.display());

            summary.batches += 1;
            summary.records += items.len();
            pb.inc(items.len() as u64);
            pb.set_message(format!("({} files)", summary.batches));
        }
        pb.finish_and_clear();

        info!(
            "Scraped a total of {} records for {}",
            summary.records, self.ticker
        );
        Ok(summary)
    }

    fn write_batch(&self, items: &[Record], path: &Path) -> Result<()> {
        let written = match self.format {
            Format::Csv => write_csv(items, path),
            Format::Json => write_json(items, path),
        };
        written.with_context(|| format!("Failed to write {}", path.display()))
    }

    /// `{TICKER}_{utc timestamp}.{ext}`, with `_{batch_no}` added if that
    /// name is already taken.
    fn next_file_path(&self, batch_no: usize) -> PathBuf {
        let stamp = Utc::now().format(OUTPUT_TIMESTAMP_FMT).to_string();
        let ext = self.format.ext();
        let path = self
            .output_path
            .join(format!("{}_{}.{}", self.ticker, stamp, ext));
        if !path.exists() {
            return path;
        }
        self.output_path
            .join(format!("{}_{}_{}.{}", self.ticker, stamp, batch_no, ext))
    }
}

/// Scrape `ticker` and write it under `root_dir` in batches of `batch_size`.
pub fn run<F: Fetch>(
    fetcher: &F,
    base_url: &str,
    ticker: &str,
    root_dir: &Path,
    batch_size: usize,
    format: Format,
    query: &ChainQuery,
) -> Result<RunSummary> {
    BatchSerializer::new(ticker, root_dir, format, batch_size)?.serialize(fetcher, base_url, query)
}

fn check_output_dir(dir: &Path) -> Result<(), ScrapeError> {
    if !dir.exists() {
        return Err(ScrapeError::OutputDirMissing(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScrapeError::OutputDirNotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(ScrapeError::OutputDirNotADirectory(dir.to_path_buf()).into());
    }
    if !dir.exists() {
        fs::create_dir(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Header from the first record's keys; the batch is assumed homogeneous.
/// A column missing from a later record is written empty.
fn write_csv(items: &[Record], path: &Path) -> Result<()> {
    let Some(first) = items.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    writer.write_record(&headers)?;
    for item in items {
        writer.write_record(headers.iter().map(|h| item.get(h).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct Items<'a> {
    items: &'a [Record],
}

fn write_json(items: &[Record], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    Items { items }.serialize(&mut ser)?;
    out.flush()?;
    Ok(())
}

// ── Tests ──
