//! Loading settings from configuration files

use std::path::Path;

use tracing::{debug, error, info, instrument, warn};

use super::SourceLoader;
use crate::utils::{is_comment_line, parse_setting_line, read_lines, strip_comment};

impl SourceLoader {
    /// Loads every active `name = value` line of `path`.
    ///
    /// Returns the number of settings read; an unreadable file is logged and
    /// counts as zero.
    #[instrument(skip(self))]
    pub fn load_file(&mut self, path: &Path) -> usize {
        let lines = match read_lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                error!("❌ Cannot open {}: {}", path.display(), e);
                self.record_failure();
                return 0;
            }
        };

        let source = path.display().to_string();
        let mut count = 0;

        for (lineno, line) in lines.iter().enumerate() {
            if line.trim().is_empty() || is_comment_line(line) {
                continue;
            }
            match parse_setting_line(line) {
                Some(parsed) => {
                    self.add(&parsed.name, &parsed.value, &source);
                    count += 1;
                }
                None if strip_comment(line).contains('=') => {
                    warn!("⚠️  Ignoring malformed line {} of {}: {}", lineno + 1, source, line);
                    self.record_malformed();
                }
                None => debug!("Skipping line {} of {}: {}", lineno + 1, source, line),
            }
        }

        info!("📄 Read {} settings from {}", count, source);
        count
    }

    /// Loads the old configuration file followed by its optional auto file.
    pub fn load_files(&mut self, path: &Path, auto_path: Option<&Path>) -> usize {
        let mut count = self.load_file(path);
        if let Some(auto) = auto_path {
            count += self.load_file(auto);
        }
        count
    }
}
