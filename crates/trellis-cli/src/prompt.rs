//! Terminal prompts on stdin/stderr.

use colored::*;
use std::io::{self, BufRead, Write};
use trellis_keys::{PromptError, Prompter, Validator};

/// Prompter reading answers from stdin.
///
/// Questions go to stderr so stdout stays clean for token output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask(&self, question: &str) -> Result<String, PromptError> {
        {
            let mut stderr = io::stderr().lock();
            write!(stderr, "{} {}", "?".green().bold(), question)?;
            stderr.flush()?;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed").into());
        }
        Ok(line.trim().to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, label: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = self.ask(&format!("{} [{}]: ", label.bold(), hint))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => eprintln!("{}", "answer y or n".yellow()),
            }
        }
    }

    fn prompt(
        &self,
        label: &str,
        default: &str,
        validator: Option<Validator<'_>>,
    ) -> Result<String, PromptError> {
        loop {
            let question = if default.is_empty() {
                format!("{}: ", label.bold())
            } else {
                format!("{} [{}]: ", label.bold(), default)
            };
            let mut answer = self.ask(&question)?;
            if answer.is_empty() {
                answer = default.to_string();
            }
            match validator.map(|v| v(&answer)) {
                Some(Err(reason)) => eprintln!("{}", reason.red()),
                _ => return Ok(answer),
            }
        }
    }
}
