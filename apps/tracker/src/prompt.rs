//! Blocking line-based user interaction.
//!
//! Used for the two interactive fallbacks: a missing job title during merge
//! and a missing postal address during enrichment.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::debug;

pub trait Prompter: Send + Sync {
    /// Prints `question` and reads one line. Blank answers and read errors
    /// are `None`; answers are trimmed.
    fn ask(&self, question: &str) -> Option<String>;

    /// Prints a line of context for the user.
    fn notice(&self, line: &str);
}

impl<P: Prompter + ?Sized> Prompter for &P {
    fn ask(&self, question: &str) -> Option<String> {
        (**self).ask(question)
    }

    fn notice(&self, line: &str) {
        (**self).notice(line)
    }
}

impl<P: Prompter + ?Sized> Prompter for Arc<P> {
    fn ask(&self, question: &str) -> Option<String> {
        (**self).ask(question)
    }

    fn notice(&self, line: &str) {
        (**self).notice(line)
    }
}

/// Reads answers from stdin, writes questions to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn ask(&self, question: &str) -> Option<String> {
        ask_line(&mut io::stdin().lock(), &mut io::stdout().lock(), question)
    }

    fn notice(&self, line: &str) {
        println!("{line}");
    }
}

/// Writes the question, then reads one answer line. A question that cannot
/// be shown is never answered.
fn ask_line(input: &mut impl BufRead, output: &mut impl Write, question: &str) -> Option<String> {
    if let Err(e) = write!(output, "{question}").and_then(|_| output.flush()) {
        debug!("Could not show prompt '{}': {e}", question.trim());
        return None;
    }

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => non_blank(&line),
        Err(e) => {
            debug!("Could not read answer: {e}");
            None
        }
    }
}

pub(crate) fn non_blank(answer: &str) -> Option<String> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Answers from a fixed script and records everything shown to the user.
#[cfg(test)]
pub struct ScriptedPrompter {
    answers: std::sync::Mutex<std::collections::VecDeque<String>>,
    transcript: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: std::sync::Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }

    pub fn questions_asked(&self) -> usize {
        self.transcript()
            .iter()
            .filter(|l| l.starts_with("? "))
            .count()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> Option<String> {
        self.transcript.lock().unwrap().push(format!("? {question}"));
        let answer = self.answers.lock().unwrap().pop_front()?;
        non_blank(&answer)
    }

    fn notice(&self, line: &str) {
        self.transcript.lock().unwrap().push(line.to_string());
    }
}
