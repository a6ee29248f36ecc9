//! Error types for the check-in engine

use thiserror::Error;

use textin_types::ContactId;

use crate::command::HELP_MESSAGE;

/// Malformed user input. Recovered locally: the contact is left unchanged and
/// the error text is sent back as the reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Empty name while waiting for one
    #[error("Please input a valid name.")]
    InvalidName,

    /// Non-numeric or non-positive interval
    #[error("Unable to parse time \"{input}\". Please input an integer.")]
    InvalidInterval { input: String },

    /// Unrecognized directive token
    #[error("Unknown command \"{command}\"\n{}", HELP_MESSAGE)]
    UnknownCommand { command: String },
}

/// Engine-level errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// The contact quit while this message was queued behind the quit
    #[error("contact {0} has been removed")]
    Retired(ContactId),
}

/// Result type using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;
