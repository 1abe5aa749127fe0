use serde::Serialize;
use std::io::{self, BufRead, Write};

use crate::bootstrap::BootstrapStep;

/// Signals the core emits towards the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum UiEvent {
    ProfileSaved { name: String },
    ProfileDeleted { name: String },
    VersionsReady { count: usize },
    VersionsFailed { reason: String },
    DependencyCheckFailed { step: BootstrapStep, remediation: String },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

#[derive(Debug, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: UiEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => log::info!("UI event: {}", payload),
            Err(e) => log::warn!("Failed to serialize UI event {:?}: {}", event, e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    /// Label of the affirmative button, if the prompt offers a choice.
    pub accept_label: Option<String>,
}

impl Prompt {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            accept_label: None,
        }
    }

    pub fn choice(
        title: impl Into<String>,
        message: impl Into<String>,
        accept_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            accept_label: Some(accept_label.into()),
        }
    }
}

/// Blocking user prompt. Returns true when the user accepted the offered action.
pub trait Prompter: Send + Sync {
    fn prompt(&self, prompt: &Prompt) -> bool;
}

#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn prompt(&self, prompt: &Prompt) -> bool {
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "\n== {} ==\n{}", prompt.title, prompt.message);

        let Some(label) = &prompt.accept_label else {
            return false;
        };
        let _ = write!(stderr, "{}? [y/N] ", label);
        let _ = stderr.flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tag() {
        let value = serde_json::to_value(UiEvent::ProfileSaved {
            name: "Survival".to_string(),
        })
        .unwrap();
        assert_eq!(value["event"], "profile-saved");
        assert_eq!(value["name"], "Survival");
    }

    #[test]
    fn info_prompt_offers_no_action() {
        let prompt = Prompt::info("Title", "Body");
        assert!(prompt.accept_label.is_none());
        let prompt = Prompt::choice("Title", "Body", "Open download page");
        assert_eq!(prompt.accept_label.as_deref(), Some("Open download page"));
    }
}
