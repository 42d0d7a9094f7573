//! JSON vectors artifact
//!
//! The artifact is the full vector array, written once after embedding. An
//! upload-only run reads it back instead of scraping again.

use crate::model::Vector;
use crate::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes `vectors` as a pretty-printed JSON array, replacing any existing file
pub fn write_vectors(path: &Path, vectors: &[Vector]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, vectors)?;
    writer.flush()?;

    tracing::info!("Saved {} vectors to {}", vectors.len(), path.display());
    Ok(())
}

/// Reads a JSON vectors artifact
pub fn read_vectors(path: &Path) -> Result<Vec<Vector>> {
    let reader = BufReader::new(File::open(path)?);
    let vectors: Vec<Vector> = serde_json::from_reader(reader)?;
    tracing::info!("Loaded {} vectors from {}", vectors.len(), path.display());
    Ok(vectors)
}
