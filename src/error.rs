// Error taxonomy for a raffle run.
//
// Every failure is terminal for the current run. The CLI only needs to tell
// apart bad input, empty results and service trouble so each
// variant maps onto one ErrorCategory with a single user-facing message.

use thiserror::Error;

use crate::bluesky::graph::XrpcError;

#[derive(Debug, Error)]
pub enum RaffleError {
    /// The post URL could not be split into an author and a record key.
    /// No network call is made before this is returned.
    #[error("invalid post reference: {0}")]
    InvalidReference(String),

    /// The URL looked fine but the author handle does not exist.
    #[error("could not resolve handle @{handle}")]
    ResolutionFailed {
        handle: String,
        #[source]
        source: XrpcError,
    },

    /// A page, batch or profile request failed after transport retries.
    #[error("failed to fetch {what}")]
    FetchFailed {
        what: String,
        #[source]
        source: XrpcError,
    },

    /// Everything succeeded but nobody qualifies.
    #[error("no qualifying participants")]
    EmptyAudience,

    /// Aggregation was asked for without a liked/reposted filter.
    #[error("select at least one engagement filter (liked or reposted)")]
    NoFilterSelected,

    #[error("raffle cancelled")]
    Cancelled,
}

/// Coarse grouping of errors for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadInput,
    NoResults,
    ServiceError,
    Cancelled,
}

impl RaffleError {
    pub(crate) fn fetch(what: impl Into<String>, source: XrpcError) -> Self {
        Self::FetchFailed {
            what: what.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidReference(_) | Self::ResolutionFailed { .. } | Self::NoFilterSelected => {
                ErrorCategory::BadInput
            }
            Self::EmptyAudience => ErrorCategory::NoResults,
            Self::FetchFailed { .. } => ErrorCategory::ServiceError,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// The one-line notice shown to the person running the raffle.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidReference(_) => "Post URL incorrect".to_string(),
            Self::ResolutionFailed { handle, .. } => {
                format!("Post URL looks valid but @{handle} does not exist")
            }
            Self::NoFilterSelected => "Tick at least one of Liked or Reposted".to_string(),
            Self::EmptyAudience => "No clout 💀".to_string(),
            Self::FetchFailed { what, source } => {
                format!("Bluesky request failed while fetching {what}: {source}")
            }
            Self::Cancelled => "Cancelled".to_string(),
        }
    }
}
