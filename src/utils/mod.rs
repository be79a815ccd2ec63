//! Utility Module Implementation
//! Author: kartik4091
//! Created: 2025-06-03
//!
//! Aggregates internal helpers for text munging and file handling.

pub mod io;
pub mod text;

pub use self::{
    io::{backup_path, create_backup, read_lines, read_text, write_text, TextEncoding, TextFile},
    text::{
        is_comment_line, normalize_value, parse_setting_line, strip_comment, trim_quotes,
        values_match, SettingLine,
    },
};
