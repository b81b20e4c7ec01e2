//! Destinations for flushed batches.
use crate::error::SinkError;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Receives batches of records in feed order.
pub trait RecordSink<T> {
    fn write_batch(&mut self, batch: &[T]) -> Result<(), SinkError>;
}

/// CSV table on disk.
///
/// The first batch creates (or truncates) the file and writes the header row;
/// every later batch is appended without one. Nothing touches the disk until
/// the first non-empty batch arrives.
pub struct CsvSink<R> {
    path: PathBuf,
    header_written: bool,
    rows_written: usize,
    _row: PhantomData<fn(&R)>,
}

impl<R> CsvSink<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            header_written: false,
            rows_written: 0,
            _row: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    fn io_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_err(&self, source: csv::Error) -> SinkError {
        SinkError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

impl<R: Serialize> RecordSink<R> for CsvSink<R> {
    fn write_batch(&mut self, batch: &[R]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let first = !self.header_written;
        let mut open = OpenOptions::new();
        if first {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
            open.write(true).create(true).truncate(true);
        } else {
            open.append(true).create(true);
        }
        let file = open.open(&self.path).map_err(|e| self.io_err(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(first)
            .from_writer(file);
        for row in batch {
            writer.serialize(row).map_err(|e| self.csv_err(e))?;
        }
        writer.flush().map_err(|e| self.io_err(e))?;

        self.header_written = true;
        self.rows_written += batch.len();
        tracing::debug!(path = %self.path.display(), rows = batch.len(), header = first, "sink.csv.append");
        Ok(())
    }
}

/// Keeps every batch in memory, in write order.
#[derive(Debug, Clone)]
pub struct MemorySink<T> {
    batches: Vec<Vec<T>>,
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self {
            batches: Vec::new(),
        }
    }
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> &[Vec<T>] {
        &self.batches
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.batches.iter().flatten()
    }
}

impl<T: Clone> RecordSink<T> for MemorySink<T> {
    fn write_batch(&mut self, batch: &[T]) -> Result<(), SinkError> {
        self.batches.push(batch.to_vec());
        Ok(())
    }
}
