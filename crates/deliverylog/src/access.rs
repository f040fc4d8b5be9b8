//! Admin dashboard access.
//!
//! Access is binary: the shared password grants everything, anything else
//! is refused. An empty input means the user has not been asked yet.

use crate::error::{Error, Result};

/// Outcome of an admin password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// No password was entered.
    NotPrompted,
    /// The password matched.
    Granted,
    /// The password did not match.
    Denied,
}

impl AccessDecision {
    /// Check `input` against `secret`.
    #[must_use]
    pub fn check(input: Option<&str>, secret: &str) -> Self {
        match input {
            None | Some("") => Self::NotPrompted,
            Some(given) if given == secret => Self::Granted,
            Some(_) => Self::Denied,
        }
    }

    /// Turn anything but [`AccessDecision::Granted`] into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthRequired`] or [`Error::AuthFailure`].
    pub fn require(self) -> Result<()> {
        match self {
            Self::Granted => Ok(()),
            Self::NotPrompted => Err(Error::AuthRequired),
            Self::Denied => Err(Error::AuthFailure),
        }
    }
}
