//! Fallback for a job title no email in a group mentioned.
//!
//! The merge step calls `resolve_missing_title` at most once per group. The
//! non-interactive implementation answers `None`; the console one asks the
//! user through a [`Prompter`].

use crate::prompt::Prompter;

pub trait TitleResolver {
    fn resolve_missing_title(&self, employer: Option<&str>) -> Option<String>;
}

/// Never asks; the title stays absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTitlePrompt;

impl TitleResolver for NoTitlePrompt {
    fn resolve_missing_title(&self, _employer: Option<&str>) -> Option<String> {
        None
    }
}

/// Asks the user for the title. An empty answer skips.
pub struct PromptTitle<P> {
    prompter: P,
}

impl<P: Prompter> PromptTitle<P> {
    pub fn new(prompter: P) -> Self {
        Self { prompter }
    }
}

impl<P: Prompter> TitleResolver for PromptTitle<P> {
    fn resolve_missing_title(&self, employer: Option<&str>) -> Option<String> {
        self.prompter.notice("");
        self.prompter.notice(&format!(
            "Job title not found for: {}",
            employer.unwrap_or("(unknown)")
        ));
        self.prompter.ask("Job title (leave empty to skip): ")
    }
}
