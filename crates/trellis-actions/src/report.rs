//! Action results.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Error => "ERR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub status: Status,
    pub message: String,
}

/// Ordered outcome messages of an action.
///
/// An action that touches several entities records one entry per entity and
/// keeps going; the caller decides failure from [`Report::has_errors`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<ReportEntry>,
    /// Seed file written for a generated key, if any
    pub generated_key_path: Option<PathBuf>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, status: Status, message: impl Into<String>) {
        self.entries.push(ReportEntry {
            status,
            message: message.into(),
        });
    }

    pub fn ok(&mut self, message: impl Into<String>) {
        self.push(Status::Ok, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Status::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Status::Error, message);
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == Status::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "[{}] {}", entry.status, entry.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_count() {
        let mut report = Report::new();
        assert!(report.is_empty());
        report.ok("pulled account \"billing\"");
        report.warn("nothing changed");
        report.error("ops: 404 Not Found");

        assert_eq!(report.entries().len(), 3);
        assert_eq!(report.error_count(), 1);
        assert!(report.has_errors());
        assert_eq!(
            report.to_string(),
            "[OK] pulled account \"billing\"\n[WARN] nothing changed\n[ERR] ops: 404 Not Found\n"
        );
    }
}
