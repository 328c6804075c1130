//! Lifecycle error taxonomy.

use desktop_app_contract::{ApplicationId, WindowId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors returned by lifecycle operations.
///
/// Surfaced kinds are alerted at the presentation boundary; suppressed kinds
/// ([`LifecycleError::is_suppressed`]) are only logged.
pub enum LifecycleError {
    /// The id is not present in the application catalog.
    #[error("application `{0}` is not installed")]
    NotInstalled(ApplicationId),
    /// Manifest or controller retrieval/parse failed.
    #[error("failed to load application `{application_id}`: {reason}")]
    LoadFailure {
        /// Application being loaded.
        application_id: ApplicationId,
        /// Failure diagnostic.
        reason: String,
    },
    /// The manifest does not declare the requested controller.
    #[error("application `{application_id}` has no controller named `{controller}`")]
    ControllerMissing {
        /// Application whose manifest was consulted.
        application_id: ApplicationId,
        /// Requested controller name.
        controller: String,
    },
    /// The operation requires a loaded application.
    #[error("application `{0}` is not running")]
    NotLoaded(ApplicationId),
    /// The window id is unknown.
    #[error("window `{0}` not found")]
    WindowNotFound(WindowId),
    /// An open of the same id is already in flight.
    #[error("application `{0}` is already loading")]
    AlreadyLoading(ApplicationId),
    /// The application is being torn down.
    #[error("application `{0}` is closing")]
    AlreadyClosing(ApplicationId),
    /// The user stopped the load through the progress indicator.
    #[error("loading application `{0}` was cancelled")]
    Cancelled(ApplicationId),
}

impl LifecycleError {
    /// Returns whether the error is an expected no-op that must not reach the user.
    pub const fn is_suppressed(&self) -> bool {
        matches!(
            self,
            Self::AlreadyLoading(_) | Self::AlreadyClosing(_) | Self::Cancelled(_)
        )
    }

    pub(crate) fn load_failure(application_id: &ApplicationId, reason: impl ToString) -> Self {
        Self::LoadFailure {
            application_id: application_id.clone(),
            reason: reason.to_string(),
        }
    }
}
