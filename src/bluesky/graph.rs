// The social-graph seam: the five read operations the raffle needs.
//
// The pipeline never talks to HTTP directly. Each stage takes a
// `&impl SocialGraph`, so the production client and the in-memory fake used
// by the integration tests are interchangeable.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a single XRPC call.
#[derive(Debug, Error)]
pub enum XrpcError {
    #[error("XRPC request failed: {nsid}")]
    Transport {
        nsid: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("XRPC {nsid} returned {status}: {message}")]
    Status {
        nsid: String,
        status: u16,
        /// The lexicon error name from the response body, e.g. `InvalidRequest`.
        error: Option<String>,
        message: String,
    },

    #[error("Failed to deserialize {nsid} response")]
    Decode {
        nsid: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{nsid} did not answer within {:.1}s", .after.as_secs_f64())]
    Timeout { nsid: String, after: Duration },
}

impl XrpcError {
    /// HTTP 429, the only error worth retrying at the transport level.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }

    /// 400 or 404: the AppView's answer for a handle or actor that doesn't
    /// exist. Auth, size and other 4xx failures are service problems.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 400 | 404, .. })
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

/// One entry of a `getRelationships` response, relative to the subject actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    Known {
        did: String,
        /// This candidate follows the subject.
        followed_by: bool,
    },
    NotFound { actor: String },
    /// A record variant this client does not understand.
    Unknown,
}

/// The display identity of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub handle: String,
    pub avatar: Option<String>,
}

#[async_trait]
pub trait SocialGraph: Send + Sync {
    /// Resolve a handle to its DID.
    async fn resolve_handle(&self, handle: &str) -> Result<String, XrpcError>;

    /// One page of DIDs of accounts that liked the post.
    async fn list_likers(
        &self,
        post_uri: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<String>, XrpcError>;

    /// One page of DIDs of accounts that reposted the post.
    async fn list_reposters(
        &self,
        post_uri: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<String>, XrpcError>;

    /// Relationships between `subject` and each of `others`. The response is
    /// not guaranteed to follow request order or to cover every candidate.
    async fn get_relationships(
        &self,
        subject: &str,
        others: &[String],
    ) -> Result<Vec<Relationship>, XrpcError>;

    async fn get_profile(&self, did: &str) -> Result<Profile, XrpcError>;
}
