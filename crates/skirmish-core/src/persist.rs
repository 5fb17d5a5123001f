//! Line-oriented agent record format.
//!
//! Each agent is four lines:
//!
//! ```text
//! <kind tag>
//! <name>
//! <x>
//! <y>
//! ```
//!
//! Kind tags are those of [`Kind::tag`]. Names are single whitespace-free
//! tokens. Blank lines between records are ignored on read; liveness is not
//! stored, so a loaded record always comes back alive.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use glam::IVec2;

use crate::agent::{AgentRecord, Kind};
use crate::error::PersistError;

/// Writes `records` in order.
///
/// # Errors
///
/// Returns [`PersistError::InvalidName`] for a name that would not read back
/// as one token, or [`PersistError::Io`] if the writer fails.
pub fn write_records<'a, W: Write>(
    mut writer: W,
    records: impl IntoIterator<Item = &'a AgentRecord>,
) -> Result<usize, PersistError> {
    let mut written = 0;
    for record in records {
        if record.name.is_empty() || record.name.chars().any(char::is_whitespace) {
            return Err(PersistError::InvalidName(record.name.clone()));
        }
        writeln!(writer, "{}", record.kind.tag())?;
        writeln!(writer, "{}", record.name)?;
        writeln!(writer, "{}", record.position.x)?;
        writeln!(writer, "{}", record.position.y)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Reads every record until end of input.
///
/// # Errors
///
/// Returns the first malformed line, or [`PersistError::Io`].
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<AgentRecord>, PersistError> {
    let mut lines = Lines {
        inner: reader.lines(),
        line: 0,
    };
    let mut records = Vec::new();

    while let Some(tag) = lines.next_non_blank()? {
        let line = lines.line;
        let kind = tag
            .parse::<u8>()
            .ok()
            .and_then(Kind::from_tag)
            .ok_or_else(|| PersistError::UnknownKind {
                line,
                tag: tag.clone(),
            })?;
        let name = lines.require("name")?;
        if name.is_empty() {
            return Err(PersistError::InvalidName(name));
        }
        let x = lines.coordinate("x")?;
        let y = lines.coordinate("y")?;
        records.push(AgentRecord::new(kind, name, IVec2::new(x, y)));
    }

    tracing::debug!(records = records.len(), "read agent records");
    Ok(records)
}

/// Writes `records` to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// As [`write_records`], plus failure to create the file.
pub fn save_to_path(path: impl AsRef<Path>, records: &[AgentRecord]) -> Result<usize, PersistError> {
    let path = path.as_ref();
    let written = write_records(BufWriter::new(File::create(path)?), records)?;
    tracing::info!(path = %path.display(), records = written, "saved agents");
    Ok(written)
}

/// Reads every record from the file at `path`.
///
/// # Errors
///
/// As [`read_records`], plus failure to open the file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Vec<AgentRecord>, PersistError> {
    let path = path.as_ref();
    let records = read_records(BufReader::new(File::open(path)?))?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded agents");
    Ok(records)
}

struct Lines<L> {
    inner: L,
    line: usize,
}

impl<L: Iterator<Item = std::io::Result<String>>> Lines<L> {
    fn next_trimmed(&mut self) -> Result<Option<String>, PersistError> {
        match self.inner.next() {
            Some(text) => {
                self.line += 1;
                Ok(Some(text?.trim().to_owned()))
            }
            None => Ok(None),
        }
    }

    fn next_non_blank(&mut self) -> Result<Option<String>, PersistError> {
        while let Some(text) = self.next_trimmed()? {
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    fn require(&mut self, field: &'static str) -> Result<String, PersistError> {
        self.next_trimmed()?.ok_or(PersistError::Truncated {
            line: self.line + 1,
            expected: field,
        })
    }

    fn coordinate(&mut self, field: &'static str) -> Result<i32, PersistError> {
        let text = self.require(field)?;
        text.parse().map_err(|_| PersistError::InvalidCoordinate {
            line: self.line,
            value: text,
        })
    }
}
