use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A pipeline step, used to label interaction failures in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Launch,
    Navigate,
    OnlineShoppingPrompt,
    Interstitial,
    SelectCategory,
    WaitStable,
    LoadMore,
    CollectListing,
    ExtractField(&'static str),
    Teardown,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Launch => write!(f, "launch"),
            Step::Navigate => write!(f, "navigate"),
            Step::OnlineShoppingPrompt => write!(f, "online shopping prompt"),
            Step::Interstitial => write!(f, "interstitial dismissal"),
            Step::SelectCategory => write!(f, "category selection"),
            Step::WaitStable => write!(f, "wait for stable page"),
            Step::LoadMore => write!(f, "load more"),
            Step::CollectListing => write!(f, "listing collection"),
            Step::ExtractField(field) => write!(f, "extract {field}"),
            Step::Teardown => write!(f, "teardown"),
        }
    }
}

/// The failure half of an interaction outcome with the browser engine.
///
/// `Ok(value)` is the success case; the three variants here are the
/// distinguishable failures every engine must report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("timed out after {}ms waiting for {what}", after.as_millis())]
    Timeout { what: String, after: Duration },

    #[error("engine error on {what}: {message}")]
    Engine { what: String, message: String },
}

/// Coarse classification of [`InteractionError`], used by call-site policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    NotFound,
    Timeout,
    Engine,
}

impl InteractionError {
    #[must_use]
    pub fn kind(&self) -> InteractionKind {
        match self {
            InteractionError::NotFound { .. } => InteractionKind::NotFound,
            InteractionError::Timeout { .. } => InteractionKind::Timeout,
            InteractionError::Engine { .. } => InteractionKind::Engine,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        InteractionError::NotFound { what: what.into() }
    }

    pub(crate) fn timeout(what: impl Into<String>, after: Duration) -> Self {
        InteractionError::Timeout {
            what: what.into(),
            after,
        }
    }

    pub(crate) fn engine(what: impl Into<String>, message: impl std::fmt::Display) -> Self {
        InteractionError::Engine {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser launch failed: {0}")]
    Launch(#[source] InteractionError),

    #[error("{step} failed: {source}")]
    Interaction {
        step: Step,
        #[source]
        source: InteractionError,
    },

    #[error("failed to write snapshot to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ScraperError {
    /// The step an interaction failure came from, if any.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            ScraperError::Launch(_) => Some(Step::Launch),
            ScraperError::Interaction { step, .. } => Some(*step),
            ScraperError::Export { .. } | ScraperError::Serialize(_) => None,
        }
    }
}
