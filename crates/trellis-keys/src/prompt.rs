//! Interactive prompting collaborator.
//!
//! The terminal implementation lives in the command line crate; library code
//! only sees the [`Prompter`] trait. [`ScriptedPrompter`] replays canned
//! answers and is used by tests and non-terminal drivers.

use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

/// Validator for free-text answers. Returns a message describing the problem.
pub type Validator<'a> = &'a (dyn Fn(&str) -> std::result::Result<(), String> + Sync);

/// Prompting errors
#[derive(Debug, Error)]
pub enum PromptError {
    /// Terminal I/O failed
    #[error("prompt I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The answer did not pass validation
    #[error("invalid answer for {label:?}: {reason}")]
    Rejected {
        /// Prompt label
        label: String,
        /// Validator message
        reason: String,
    },

    /// No scripted answer was left for a prompt
    #[error("no answer available for {0:?}")]
    Exhausted(String),
}

/// Asks the user questions
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question
    fn confirm(&self, label: &str, default: bool) -> Result<bool, PromptError>;

    /// Ask for free text, optionally validated
    fn prompt(
        &self,
        label: &str,
        default: &str,
        validator: Option<Validator<'_>>,
    ) -> Result<String, PromptError>;
}

/// A canned answer for [`ScriptedPrompter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answer to [`Prompter::confirm`]
    Confirm(bool),
    /// Answer to [`Prompter::prompt`]; empty text selects the default
    Text(String),
}

/// Prompter that replays a fixed list of answers in order
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    /// Create a prompter that will give `answers` in order
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Labels of the questions asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Number of answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }

    fn next(&self, label: &str) -> Result<Answer, PromptError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(label.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .ok_or_else(|| PromptError::Exhausted(label.to_string()))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, label: &str, _default: bool) -> Result<bool, PromptError> {
        match self.next(label)? {
            Answer::Confirm(value) => Ok(value),
            Answer::Text(text) => Err(PromptError::Rejected {
                label: label.to_string(),
                reason: format!("expected yes/no, got {:?}", text),
            }),
        }
    }

    fn prompt(
        &self,
        label: &str,
        default: &str,
        validator: Option<Validator<'_>>,
    ) -> Result<String, PromptError> {
        let value = match self.next(label)? {
            Answer::Text(text) if text.is_empty() => default.to_string(),
            Answer::Text(text) => text,
            Answer::Confirm(value) => {
                return Err(PromptError::Rejected {
                    label: label.to_string(),
                    reason: format!("expected text, got {}", value),
                })
            }
        };
        if let Some(validate) = validator {
            validate(&value).map_err(|reason| PromptError::Rejected {
                label: label.to_string(),
                reason,
            })?;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_replayed_in_order() {
        let prompter = ScriptedPrompter::new([
            Answer::Confirm(true),
            Answer::Text("billing".to_string()),
        ]);

        assert!(prompter.confirm("generate", false).unwrap());
        assert_eq!(prompter.prompt("name", "", None).unwrap(), "billing");
        assert_eq!(prompter.asked(), vec!["generate", "name"]);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_empty_text_selects_default() {
        let prompter = ScriptedPrompter::new([Answer::Text(String::new())]);
        assert_eq!(prompter.prompt("name", "acme", None).unwrap(), "acme");
    }

    #[test]
    fn test_validator_rejects() {
        let prompter = ScriptedPrompter::new([Answer::Text("bad".to_string())]);
        let validator = |v: &str| {
            if v == "bad" {
                Err("nope".to_string())
            } else {
                Ok(())
            }
        };
        let err = prompter.prompt("name", "", Some(&validator)).unwrap_err();
        assert!(matches!(err, PromptError::Rejected { .. }));
    }

    #[test]
    fn test_exhausted() {
        let prompter = ScriptedPrompter::new([]);
        assert!(matches!(
            prompter.confirm("anything", true),
            Err(PromptError::Exhausted(_))
        ));
    }
}
