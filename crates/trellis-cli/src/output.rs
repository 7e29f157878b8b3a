//! Reading inputs, writing outputs and printing reports.

use anyhow::{bail, Context, Result};
use colored::*;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::Path;
use trellis_actions::{Report, Status};

/// Path that stands for stdin or stdout
pub const STDIO: &str = "--";

/// Write `contents` to `target`, or to stdout for [`STDIO`].
///
/// Existing files are never overwritten.
pub fn write_output(target: &str, contents: &str) -> Result<()> {
    if target == STDIO {
        let mut stdout = io::stdout().lock();
        stdout.write_all(contents.as_bytes())?;
        if !contents.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        return Ok(());
    }
    let path = Path::new(target);
    if path.exists() {
        bail!("{} already exists; refusing to overwrite it", path.display());
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read `source`, or stdin for [`STDIO`]
pub fn read_input(source: &str) -> Result<String> {
    if source == STDIO {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))
}

pub fn print_report(report: &Report) {
    for entry in report.entries() {
        let status = match entry.status {
            Status::Ok => format!("[{}]", entry.status).green(),
            Status::Warn => format!("[{}]", entry.status).yellow(),
            Status::Error => format!("[{}]", entry.status).red(),
        };
        println!("{} {}", status.bold(), entry.message);
    }
    if report.has_errors() {
        eprintln!(
            "{}",
            format!("{} of {} failed", report.error_count(), report.entries().len()).red()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billing.jwt");
        let target = path.to_str().unwrap();

        write_output(target, "first").unwrap();
        let err = write_output(target, "second").unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        assert_eq!(read_input(target).unwrap(), "first");
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jwt");
        assert!(read_input(path.to_str().unwrap()).is_err());
    }
}
