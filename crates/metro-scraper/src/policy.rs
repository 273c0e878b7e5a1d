//! Call-site failure policies for browser interactions.
//!
//! Every interaction returns `Result<T, InteractionError>`. Instead of each
//! step deciding ad hoc whether to swallow a failure, the step names a
//! [`Policy`] and hands the outcome to [`apply`], which either passes the
//! value through, logs and drops a tolerated failure, or converts it into a
//! [`ScraperError::Interaction`] tagged with the step.

use crate::error::{InteractionError, InteractionKind, ScraperError, Step};

/// Log level used when a tolerated failure is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The call site reports the miss itself; the failure detail goes to
    /// `debug`.
    Debug,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Every failure aborts the step.
    Propagate,
    /// Failures of the listed kinds are logged and become `Ok(None)`; any
    /// other kind still propagates.
    Tolerate {
        kinds: &'static [InteractionKind],
        severity: Severity,
    },
}

impl Policy {
    /// Absence is expected: not-found and timeout are tolerated and left to
    /// the caller to report.
    pub const ABSENCE: Policy = Policy::Tolerate {
        kinds: &[InteractionKind::NotFound, InteractionKind::Timeout],
        severity: Severity::Debug,
    };

    /// Like [`Policy::BEST_EFFORT`], but the caller reports the miss.
    pub const EXHAUSTION: Policy = Policy::Tolerate {
        kinds: &[
            InteractionKind::NotFound,
            InteractionKind::Timeout,
            InteractionKind::Engine,
        ],
        severity: Severity::Debug,
    };

    /// Best-effort step: nothing it does can abort the run.
    pub const BEST_EFFORT: Policy = Policy::Tolerate {
        kinds: &[
            InteractionKind::NotFound,
            InteractionKind::Timeout,
            InteractionKind::Engine,
        ],
        severity: Severity::Warn,
    };

    /// A slow page may still be usable; hard failures are not.
    pub const SLOW_NAVIGATION: Policy = Policy::Tolerate {
        kinds: &[InteractionKind::Timeout],
        severity: Severity::Error,
    };

    #[must_use]
    pub fn tolerates(&self, kind: InteractionKind) -> bool {
        match self {
            Policy::Propagate => false,
            Policy::Tolerate { kinds, .. } => kinds.contains(&kind),
        }
    }
}

/// Resolves an interaction outcome according to `policy`.
///
/// # Errors
///
/// Returns [`ScraperError::Interaction`] when the failure kind is not
/// tolerated by `policy`.
pub fn apply<T>(
    step: Step,
    policy: Policy,
    outcome: Result<T, InteractionError>,
) -> Result<Option<T>, ScraperError> {
    let err = match outcome {
        Ok(value) => return Ok(Some(value)),
        Err(err) => err,
    };

    match policy {
        Policy::Tolerate { severity, .. } if policy.tolerates(err.kind()) => {
            match severity {
                Severity::Debug => tracing::debug!(%step, error = %err, "tolerated interaction failure"),
                Severity::Warn => tracing::warn!(%step, error = %err, "tolerated interaction failure"),
                Severity::Error => {
                    tracing::error!(%step, error = %err, "tolerated interaction failure");
                }
            }
            Ok(None)
        }
        _ => Err(ScraperError::Interaction { step, source: err }),
    }
}
