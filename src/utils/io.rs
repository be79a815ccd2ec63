//! IO Utilities for configuration files
//! Author: kartik4091

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument, warn};

use crate::error::Result;

/// Character encoding a configuration file was read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// Single-byte fallback for files that are not valid UTF-8. Every byte
    /// maps to one char, so untouched lines are written back unchanged.
    Latin1,
}

/// Lines of a configuration file together with their encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub lines: Vec<String>,
    pub encoding: TextEncoding,
}

/// Reads a text file and splits it into lines without line terminators.
///
/// Carriage returns left over from CRLF files are stripped.
#[instrument]
pub fn read_text(path: &Path) -> Result<TextFile> {
    let (content, encoding) = match String::from_utf8(fs::read(path)?) {
        Ok(content) => (content, TextEncoding::Utf8),
        Err(e) => {
            warn!("⚠️  {} is not valid UTF-8, reading it as Latin-1", path.display());
            let content: String = e.into_bytes().into_iter().map(char::from).collect();
            (content, TextEncoding::Latin1)
        }
    };

    let lines = content
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect::<Vec<_>>();
    debug!("Read {} lines from {}", lines.len(), path.display());
    Ok(TextFile { lines, encoding })
}

/// Reads the lines of a text file, whatever its encoding.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    read_text(path).map(|file| file.lines)
}

/// Writes lines to a file in `encoding`, creating or overwriting it.
///
/// Characters a Latin-1 file cannot hold are written as `?`.
#[instrument(skip(lines))]
pub fn write_text(path: &Path, lines: &[String], encoding: TextEncoding) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');

    let bytes = match encoding {
        TextEncoding::Utf8 => content.into_bytes(),
        TextEncoding::Latin1 => {
            let mut replaced = 0;
            let bytes = content
                .chars()
                .map(|ch| {
                    u8::try_from(u32::from(ch)).unwrap_or_else(|_| {
                        replaced += 1;
                        b'?'
                    })
                })
                .collect::<Vec<_>>();
            if replaced > 0 {
                warn!("⚠️  {} characters do not fit Latin-1 in {}", replaced, path.display());
            }
            bytes
        }
    };

    fs::write(path, bytes)?;
    Ok(())
}

/// Path of the backup copy kept next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copies `path` to its `.bak` sibling and returns the backup location.
#[instrument]
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    fs::copy(path, &backup)?;
    Ok(backup)
}
