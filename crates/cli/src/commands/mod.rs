//! CLI command implementations.

pub mod session;
pub mod shop;

use thiserror::Error;

use aixel_core::EmailError;
use aixel_tracker::{ConfigError, StorageError, StorefrontError, TrackOutcome};

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment or flag value is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The state file could not be opened.
    #[error("State storage error: {0}")]
    Storage(#[from] StorageError),

    /// The login email was rejected.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The shopper action is not possible right now.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),
}

/// Print one line per tracking call.
#[allow(clippy::print_stdout)]
pub fn report(event_type: &str, outcome: &TrackOutcome) {
    match outcome {
        TrackOutcome::Delivered(response) => println!("  ✓ {event_type} tracked {response}"),
        TrackOutcome::Skipped => println!("  · {event_type} skipped (duplicate)"),
        TrackOutcome::Failed => println!("  ✗ {event_type} not delivered (see log)"),
    }
}
