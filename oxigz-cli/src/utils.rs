//! Utility functions for the CLI.

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use oxigz::{GzipFile, OpenMode, ReaderOptions, codepage};
use std::path::Path;

/// Open a GZIP file by path, applying an optional codepage label.
pub fn open_gzip(path: &Path, codepage: Option<&str>) -> oxigz::Result<GzipFile<'static>> {
    let mut options = ReaderOptions::default();
    if let Some(label) = codepage {
        options = options.with_codepage(codepage::from_label(label)?);
    }

    let mut file = GzipFile::with_options(options);
    file.open(path, OpenMode::Read)?;
    Ok(file)
}

/// Create a byte progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Format a Unix timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(secs: u32) -> String {
    if secs == 0 {
        return "unknown".to_string();
    }

    match DateTime::<Utc>::from_timestamp(i64::from(secs), 0) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => secs.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "unknown");
        assert_eq!(format_timestamp(86_400), "1970-01-02 00:00:00 UTC");
        assert_eq!(format_timestamp(1_600_000_000), "2020-09-13 12:26:40 UTC");
        assert_eq!(format_timestamp(951_782_400), "2000-02-29 00:00:00 UTC");
    }
}
