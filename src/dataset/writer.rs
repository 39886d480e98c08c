//! Append-only JSONL output

use super::Sample;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination for assembled samples, written one at a time in order
pub trait SampleSink {
    fn write_sample(&mut self, sample: &Sample) -> Result<()>;
}

impl SampleSink for Vec<Sample> {
    fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        self.push(sample.clone());
        Ok(())
    }
}

/// Writes one JSON object per line and flushes after every record
pub struct JsonlWriter<W: Write> {
    writer: W,
    written: usize,
}

impl JsonlWriter<BufWriter<File>> {
    /// Create (truncate) an output file, creating parent directories
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {:?}", path))?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SampleSink for JsonlWriter<W> {
    fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        // Serialize fully before touching the writer so a failure never
        // leaves half a record behind.
        let mut line = serde_json::to_string(sample).context("Failed to serialize sample")?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .context("Failed to write sample")?;
        self.writer.flush().context("Failed to flush sample")?;
        self.written += 1;

        Ok(())
    }
}
