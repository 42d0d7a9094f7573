//! Logging setup
//!
//! Log lines go to the console and to a plain-text file that rotates by size:
//! once the live file would exceed `max_bytes` it is renamed to `<file>.1`,
//! older backups shift up by one and anything past `backups` is deleted.

use crate::config::LoggingConfig;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Size-rotated log file writer
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    /// Opens (or creates) the log file, appending to existing content
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backups,
            file,
            written,
        })
    }

    fn backup_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = File::create(&self.path)?;
        } else {
            let oldest = self.backup_path(self.backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..self.backups).rev() {
                let from = self.backup_path(n);
                if from.exists() {
                    fs::rename(&from, self.backup_path(n + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
            self.file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Builds the console filter from CLI verbosity flags
pub fn env_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("criterion_pipeline=info,warn"),
            1 => EnvFilter::new("criterion_pipeline=debug,info"),
            2 => EnvFilter::new("criterion_pipeline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Installs the global subscriber: console plus rotating file
///
/// If the log file cannot be opened, logging continues on the console only
/// and the returned error explains why.
pub fn setup_logging(config: &LoggingConfig, verbose: u8, quiet: bool) -> io::Result<()> {
    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match RotatingFile::open(&config.file, config.max_bytes, config.backups) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(env_filter(verbose, quiet))
                .with(console)
                .with(file_layer)
                .init();
            Ok(())
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(env_filter(verbose, quiet))
                .with(console)
                .init();
            Err(e)
        }
    }
}
