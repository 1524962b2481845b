use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use delance_core::Role;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use strum::IntoEnumIterator;

use crate::command::COMMAND_WORDS;

/// Completion, highlighting and hints for the REPL.
#[derive(Clone)]
pub struct CliHelper {
    roles: Vec<String>,
}

impl CliHelper {
    pub fn new() -> Self {
        Self {
            roles: Role::iter().map(|role| role.to_string()).collect(),
        }
    }

    fn candidates<'a>(&'a self, line: &str) -> (usize, Vec<&'a str>) {
        match line.strip_prefix("role ") {
            Some(rest) => {
                let partial = rest.trim_start();
                (
                    line.len() - partial.len(),
                    self.roles
                        .iter()
                        .map(String::as_str)
                        .filter(|role| role.starts_with(partial))
                        .collect(),
                )
            }
            None if !line.contains(' ') => (
                0,
                COMMAND_WORDS
                    .iter()
                    .copied()
                    .filter(|word| word.starts_with(line))
                    .collect(),
            ),
            None => (0, Vec::new()),
        }
    }

    /// The rest of the first candidate longer than what was typed.
    fn completion_hint(&self, line: &str) -> Option<String> {
        if line.is_empty() {
            return None;
        }
        let (start, words) = self.candidates(line);
        let typed = &line[start..];
        words
            .into_iter()
            .find(|word| word.len() > typed.len())
            .map(|word| word[typed.len()..].to_string())
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word.to_string(),
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let word = line.split(' ').next().unwrap_or_default();
        if COMMAND_WORDS.contains(&word) {
            Owned(format!("{}{}", word.bright_cyan(), &line[word.len()..]))
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        self.completion_hint(&line[..pos])
    }
}

impl Validator for CliHelper {}
