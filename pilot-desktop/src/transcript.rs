use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Source of a transcript line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptRole {
    /// Datagram handed to the transport.
    Transmit,
    /// Lock gesture transition.
    Lock,
    /// Parameter change.
    Parameter,
    /// Link resolution and transport notes.
    Network,
}

impl TranscriptRole {
    pub fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Transmit => "TX   ",
            TranscriptRole::Lock => "LOCK ",
            TranscriptRole::Parameter => "PARAM",
            TranscriptRole::Network => "NET  ",
        }
    }
}

/// Append-only session log with millisecond offsets from session start.
pub struct TranscriptLogger<W: Write = BufWriter<File>> {
    writer: W,
}

impl TranscriptLogger {
    /// Creates (or truncates) the transcript at `path` and writes its header.
    pub fn create(path: &Path, title: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self::new(BufWriter::new(file));
        logger.write_header(title)?;
        Ok(logger)
    }
}

impl<W: Write> TranscriptLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.writer, "# {title}")?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    pub fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
