//! Per-file read offsets and the bounded read of newly appended lines.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// Complete lines appended to a file since the last consumed offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailChunk {
    /// Non-blank lines with their terminators removed.
    pub lines: Vec<String>,
    /// Bytes of complete lines consumed, blank ones included.
    pub consumed: u64,
}

/// Read whatever complete lines follow `offset` in `path`.
///
/// Returns `Ok(None)` if the file does not exist and an error if the path is
/// not a regular file. Only bytes present when
/// the file was opened are read, and a trailing line without `\n` is left
/// for a later call, so `consumed` always ends on a line boundary.
pub fn read_appended(path: &Path, offset: u64) -> io::Result<Option<TailChunk>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    let len = metadata.len();
    if len <= offset {
        return Ok(Some(TailChunk::default()));
    }

    file.seek(SeekFrom::Start(offset))?;
    let available = len - offset;
    let mut buf = Vec::with_capacity(usize::try_from(available).unwrap_or(0));
    file.take(available).read_to_end(&mut buf)?;

    let Some(last_newline) = buf.iter().rposition(|&byte| byte == b'\n') else {
        return Ok(Some(TailChunk::default()));
    };
    let complete = &buf[..=last_newline];

    Ok(Some(TailChunk {
        lines: split_lines(complete),
        consumed: complete.len() as u64,
    }))
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Read offsets for the files of one monitoring session.
#[derive(Debug, Clone, Default)]
pub struct FileOffsets {
    offsets: HashMap<PathBuf, u64>,
}

impl FileOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> u64 {
        self.offsets.get(path).copied().unwrap_or(0)
    }

    /// Move the offset of `path` forward by `consumed` bytes.
    pub fn advance(&mut self, path: &Path, consumed: u64) -> u64 {
        let offset = self.offsets.entry(path.to_path_buf()).or_insert(0);
        *offset = offset.saturating_add(consumed);
        *offset
    }

    /// Start every existing file at its current length so only content
    /// written from now on is examined. Never moves an offset backwards.
    pub fn skip_existing(&mut self, paths: &[PathBuf]) {
        for path in paths {
            if let Ok(metadata) = std::fs::metadata(path) {
                let offset = self.offsets.entry(path.clone()).or_insert(0);
                *offset = (*offset).max(metadata.len());
            }
        }
    }
}
