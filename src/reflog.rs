//! Reflog parsing.
//!
//! Consumes the raw output of `git reflog --date=iso` and keeps only branch
//! checkout transitions. All other reflog actions (`commit:`, `rebase:`,
//! `pull:`, ...) and malformed timestamps are silently skipped. Records come
//! back in reflog order, newest first, with timestamps normalised to UTC.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// A single checkout transition parsed from the reflog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRecord {
    pub commit_ref: String,
    pub timestamp: DateTime<Utc>,
    pub previous: String,
    pub next: String,
}

// "abc1234 HEAD@{2025-06-15 14:30:00 +0200}: checkout: moving from main to feature-x"
fn line_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([0-9a-f]+)\s+HEAD@\{(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}\s+[+-]\d{4})\}:\s+checkout:\s+moving from (\S+) to (\S+)$",
        )
        .unwrap()
    })
}

/// Parse reflog output into checkout records.
pub fn parse_reflog(output: &str) -> Vec<CheckoutRecord> {
    let mut records = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(caps) = line_pattern().captures(line) else {
            continue;
        };

        let Ok(timestamp) = DateTime::parse_from_str(&caps[2], "%Y-%m-%d %H:%M:%S %z") else {
            continue;
        };

        records.push(CheckoutRecord {
            commit_ref: caps[1].to_string(),
            timestamp: timestamp.with_timezone(&Utc),
            previous: caps[3].to_string(),
            next: caps[4].to_string(),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_checkout_lines_only() {
        let output = "\
abc1234 HEAD@{2025-06-15 14:30:00 +0200}: checkout: moving from main to feature-x
def5678 HEAD@{2025-06-15 12:00:00 +0200}: commit: add widget
abc9999 HEAD@{2025-06-14 09:00:00 +0200}: rebase (finish): returning to refs/heads/main
aaa1111 HEAD@{2025-06-13 08:00:00 +0200}: pull: Fast-forward
bbb2222 HEAD@{2025-06-12 10:15:00 +0200}: checkout: moving from feature-x to main
";
        let records = parse_reflog(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].previous, "main");
        assert_eq!(records[0].next, "feature-x");
        assert_eq!(records[1].previous, "feature-x");
        assert_eq!(records[1].next, "main");
    }

    #[test]
    fn normalises_to_utc() {
        let output =
            "abc1234 HEAD@{2025-06-15 14:30:00 +0200}: checkout: moving from main to feature-x";
        let records = parse_reflog(output);
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn negative_offsets() {
        let output = "abc1234 HEAD@{2025-06-15 08:00:00 -0500}: checkout: moving from a to b";
        let records = parse_reflog(output);
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2025, 6, 15, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn skips_malformed_timestamps() {
        let output = "abc1234 HEAD@{2025-13-99 14:30:00 +0200}: checkout: moving from a to b";
        assert!(parse_reflog(output).is_empty());
    }

    #[test]
    fn keeps_reflog_order() {
        let output = "\
aaa0001 HEAD@{2025-06-15 10:00:00 +0000}: checkout: moving from a to b
aaa0002 HEAD@{2025-06-14 10:00:00 +0000}: checkout: moving from b to a
aaa0003 HEAD@{2025-06-13 10:00:00 +0000}: checkout: moving from c to b
";
        let records = parse_reflog(output);
        assert_eq!(records[0].commit_ref, "aaa0001");
        assert_eq!(records[2].commit_ref, "aaa0003");
    }

    #[test]
    fn empty_input() {
        assert!(parse_reflog("").is_empty());
        assert!(parse_reflog("\n\n").is_empty());
    }
}
