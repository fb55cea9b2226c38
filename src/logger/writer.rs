//! Log writer
//!
//! Two output streams: access/info lines and error/warning lines. Each goes
//! to an append-mode file when configured, otherwise to stdout or stderr.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Which of the two log streams a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Access log lines and informational messages
    Access,
    /// Errors and warnings
    Error,
}

impl Stream {
    fn console(self, message: &str) {
        match self {
            Self::Access => println!("{message}"),
            Self::Error => eprintln!("{message}"),
        }
    }
}

enum Sink {
    Console(Stream),
    File(Mutex<File>),
}

impl Sink {
    fn open(path: Option<&str>, stream: Stream) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(open_append(Path::new(path))?))),
            None => Ok(Self::Console(stream)),
        }
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Console(stream) => stream.console(message),
            Self::File(file) => {
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(file, "{message}");
            }
        }
    }
}

pub struct LogWriter {
    access: Sink,
    error: Sink,
}

impl LogWriter {
    fn open(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            access: Sink::open(access_log_file, Stream::Access)?,
            error: Sink::open(error_log_file, Stream::Error)?,
        })
    }

    pub fn write(&self, stream: Stream, message: &str) {
        match stream {
            Stream::Access => self.access.write_line(message),
            Stream::Error => self.error.write_line(message),
        }
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter").finish_non_exhaustive()
    }
}

/// Open `path` for appending, creating missing parent directories
fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the process-wide writer. Fails if a log file cannot be opened or
/// a writer is already installed.
pub fn init(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let writer = LogWriter::open(access_log_file, error_log_file)?;
    LOG_WRITER
        .set(writer)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "log writer already initialized"))
}

/// Write one line to `stream`.
///
/// Before [`init`] runs (and in tests) lines go straight to the console.
pub fn emit(stream: Stream, message: &str) {
    match LOG_WRITER.get() {
        Some(writer) => writer.write(stream, message),
        None => stream.console(message),
    }
}
