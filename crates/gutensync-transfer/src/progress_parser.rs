//! Parses rsync's `--progress` stdout stream into [`TransferProgress`]
//! records.
//!
//! Robust to unknown lines (ignored except to emit a heartbeat before any
//! real progress has been seen) and to missing optional fields within a
//! recognized line.

use gutensync_core::TransferProgress;

/// Incremental parser: holds the running totals a single progress line
/// cannot carry on its own (cumulative files/bytes transferred).
#[derive(Default)]
pub struct ProgressParser {
    files_transferred: u64,
    bytes_transferred: u64,
    total_bytes: Option<u64>,
    total_files: Option<u64>,
    seen_any_progress: bool,
}

impl ProgressParser {
    /// Build a fresh parser with zeroed totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of rsync stdout, returning a progress update when the
    /// line carries new information.
    pub fn feed(&mut self, line: &str) -> Option<TransferProgress> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(total) = parse_total_size(trimmed) {
            self.total_bytes = Some(total);
            return Some(self.snapshot(None));
        }

        if let Some(total_files) = parse_files_to_consider(trimmed) {
            self.total_files = Some(total_files);
            return Some(self.snapshot(None));
        }

        if let Some((bytes, speed, eta, current_file)) = parse_per_file_progress(trimmed) {
            self.seen_any_progress = true;
            self.bytes_transferred = self.bytes_transferred.max(bytes);
            if trimmed.contains("100%") {
                self.files_transferred += 1;
            }
            let mut progress = self.snapshot(speed);
            progress.eta_seconds = eta;
            progress.current_file = current_file;
            return Some(progress);
        }

        // A filename line (rsync prints the relative path being sent on its
        // own line right before its progress line) or any other chatter.
        if !self.seen_any_progress {
            let mut progress = self.snapshot(None);
            progress.current_file = Some(trimmed.to_string());
            return Some(progress);
        }

        None
    }

    fn snapshot(&self, speed_bytes_per_sec: Option<f64>) -> TransferProgress {
        TransferProgress {
            current_file: None,
            files_transferred: self.files_transferred,
            bytes_transferred: self.bytes_transferred,
            total_bytes: self.total_bytes,
            total_files: self.total_files,
            speed_bytes_per_sec,
            eta_seconds: None,
        }
    }
}

/// Matches `"total size is 1,234,567  speedup is 1.00"`.
fn parse_total_size(line: &str) -> Option<u64> {
    let rest = line.strip_prefix("total size is ")?;
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Matches the file-list preamble, e.g. `"12,345 files to consider"`.
fn parse_files_to_consider(line: &str) -> Option<u64> {
    if !line.ends_with("files to consider") {
        return None;
    }
    let digits: String = line
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Matches a per-file progress line:
/// `"      1,234,567  45%   12.34MB/s    0:00:12 pg1.txt"` or the simpler
/// `"      1,234,567 100%"` with no rate/eta/filename. The filename, when
/// present, is the trailing whitespace-separated token.
fn parse_per_file_progress(line: &str) -> Option<(u64, Option<f64>, Option<f64>, Option<String>)> {
    let mut fields = line.split_whitespace();

    let bytes_field = fields.next()?;
    if !bytes_field.chars().next()?.is_ascii_digit() {
        return None;
    }
    let bytes: u64 = bytes_field.replace(',', "").parse().ok()?;

    let percent_field = fields.next()?;
    if !percent_field.ends_with('%') {
        return None;
    }

    let speed = fields.next().and_then(parse_rate);
    let eta = fields.next().and_then(parse_eta);
    let current_file = fields.next().map(str::to_string);

    Some((bytes, speed, eta, current_file))
}

/// Parses a rate token like `12.34MB/s` or `512.00kB/s` into bytes/sec.
fn parse_rate(token: &str) -> Option<f64> {
    let token = token.strip_suffix("/s")?;
    let unit_start = token.find(|c: char| c.is_alphabetic())?;
    let (number, unit) = token.split_at(unit_start);
    let value: f64 = number.parse().ok()?;
    let multiplier = match unit {
        "B" => 1.0,
        "kB" | "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(value * multiplier)
}

/// Parses an ETA token like `0:00:12` or `1:02:03:04` into seconds.
fn parse_eta(token: &str) -> Option<f64> {
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 2 || parts.len() > 4 {
        return None;
    }
    let mut seconds: f64 = 0.0;
    for part in &parts {
        seconds = seconds * 60.0 + part.parse::<f64>().ok()?;
    }
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_total_size_line() {
        let mut parser = ProgressParser::new();
        let progress = parser.feed("total size is 1,234,567  speedup is 1.00").unwrap();
        assert_eq!(progress.total_bytes, Some(1_234_567));
    }

    #[test]
    fn parses_files_to_consider_line() {
        let mut parser = ProgressParser::new();
        let progress = parser.feed("12,345 files to consider").unwrap();
        assert_eq!(progress.total_files, Some(12_345));
    }

    #[test]
    fn parses_per_file_progress_with_rate_and_eta() {
        let mut parser = ProgressParser::new();
        let progress = parser
            .feed("      1,234,567  45%   12.34MB/s    0:00:12")
            .unwrap();
        assert_eq!(progress.bytes_transferred, 1_234_567);
        assert!(progress.speed_bytes_per_sec.unwrap() > 0.0);
        assert_eq!(progress.eta_seconds, Some(12.0));
    }

    #[test]
    fn parses_trailing_filename_token() {
        let mut parser = ProgressParser::new();
        let progress = parser.feed("  1048576 50% 1.00MB/s 0:00:05 pg1.txt").unwrap();
        assert_eq!(progress.current_file, Some("pg1.txt".to_string()));
    }

    #[test]
    fn counts_a_completed_file_at_100_percent() {
        let mut parser = ProgressParser::new();
        parser.feed("      1,234,567 100%   12.34MB/s    0:00:00");
        assert_eq!(parser.files_transferred, 1);
    }

    #[test]
    fn unknown_lines_before_any_progress_emit_a_heartbeat() {
        let mut parser = ProgressParser::new();
        let progress = parser.feed("building file list ...").unwrap();
        assert_eq!(progress.current_file, Some("building file list ...".to_string()));
    }

    #[test]
    fn unknown_lines_after_progress_has_started_are_ignored() {
        let mut parser = ProgressParser::new();
        parser.feed("      1,234,567  45%   12.34MB/s    0:00:12");
        assert!(parser.feed("some trailing chatter").is_none());
    }

    #[test]
    fn blank_lines_are_ignored() {
        let mut parser = ProgressParser::new();
        assert!(parser.feed("   ").is_none());
    }
}
