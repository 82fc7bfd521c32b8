//! Rotating file writer plugged into `tracing_subscriber::fmt`

use crate::logger::LoggerError;
use crate::logger::config::FileConfig;
use crate::logger::rotation::RotationManager;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
}

struct WriterState {
    path: PathBuf,
    file: BufWriter<File>,
    current_size: u64,
    rotation: RotationManager,
    /// Set after a write failure; output then goes to stderr
    fallback: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self, LoggerError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            std::fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                path: config.path.clone(),
                file,
                current_size,
                rotation: RotationManager::new(config.rotation.clone()),
                fallback: false,
            })),
        })
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            state: self.state.clone(),
        }
    }
}

pub struct RotatingWriterGuard {
    state: Arc<Mutex<WriterState>>,
}

impl WriterState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.rotation
            .rotate(&self.path)
            .map_err(|e| io::Error::other(e.to_string()))?;
        self.file = open_log_file(&self.path, false)?;
        self.current_size = 0;
        Ok(())
    }

    fn write_file(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.rotation.should_rotate(self.current_size) {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.current_size += written as u64;
        Ok(written)
    }
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;

        if state.fallback {
            return io::stderr().write(buf);
        }

        match state.write_file(buf) {
            Ok(written) => Ok(written),
            Err(e) => {
                state.fallback = true;
                let _ = writeln!(
                    io::stderr(),
                    "log file {} unavailable ({}), falling back to stderr",
                    state.path.display(),
                    e
                );
                io::stderr().write(buf)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;
        if state.fallback {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(BufWriter::new(file))
}
