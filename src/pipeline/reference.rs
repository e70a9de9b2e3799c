// Post reference parsing and DID resolution.
//
// A post URL looks like https://bsky.app/profile/<handle-or-did>/post/<rkey>.
// The engagement endpoints want an AT-URI whose authority is always a DID,
// so a handle in the URL costs one resolveHandle call; a DID costs none.

use std::fmt;

use atrium_api::types::string::{Did, Handle};
use tracing::debug;

use super::context::RunContext;
use crate::bluesky::graph::SocialGraph;
use crate::error::RaffleError;

/// Collection NSID of post records.
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Index of the author segment in `url.split('/')`.
const AUTHOR_SEGMENT: usize = 4;

/// `https:`, ``, host, `profile`, author, `post`, rkey
const MIN_SEGMENTS: usize = 7;

/// Author and record key extracted from a post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    /// A handle or a DID, exactly as it appeared in the URL.
    pub author: String,
    pub record_key: String,
}

impl PostReference {
    /// Split a post URL into author and record key. Never touches the network.
    pub fn parse(url: &str) -> Result<Self, RaffleError> {
        // Share links sometimes carry a query string or fragment.
        let url = url.trim();
        let url = url.split(['?', '#']).next().unwrap_or_default();

        let segments: Vec<&str> = url.split('/').collect();
        if segments.len() < MIN_SEGMENTS {
            return Err(RaffleError::InvalidReference(format!(
                "expected https://bsky.app/profile/<handle>/post/<id>, got {url:?}"
            )));
        }

        let author = segments[AUTHOR_SEGMENT];
        let record_key = segments[segments.len() - 1];
        if author.is_empty() || record_key.is_empty() {
            return Err(RaffleError::InvalidReference(format!(
                "missing author or post id in {url:?}"
            )));
        }

        let reference = Self {
            author: author.to_string(),
            record_key: record_key.to_string(),
        };

        // Syntax-check the author so obviously bad input never reaches the API.
        if reference.author_is_did() {
            author
                .parse::<Did>()
                .map_err(|e| RaffleError::InvalidReference(format!("{author}: {e}")))?;
        } else {
            author
                .parse::<Handle>()
                .map_err(|e| RaffleError::InvalidReference(format!("{author}: {e}")))?;
        }

        Ok(reference)
    }

    pub fn author_is_did(&self) -> bool {
        self.author.starts_with("did:")
    }
}

/// `at://<did>/app.bsky.feed.post/<rkey>`, with the authority always a DID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPostUri {
    author_did: String,
    uri: String,
}

impl CanonicalPostUri {
    pub fn new(author_did: &str, record_key: &str) -> Self {
        Self {
            author_did: author_did.to_string(),
            uri: format!("at://{author_did}/{POST_COLLECTION}/{record_key}"),
        }
    }

    pub fn author_did(&self) -> &str {
        &self.author_did
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl fmt::Display for CanonicalPostUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Turn a parsed reference into a canonical post URI.
///
/// DIDs are used verbatim. Handles are resolved with exactly one call; a 400
/// or 404 answer means the handle doesn't exist (`ResolutionFailed`),
/// anything else is a service problem (`FetchFailed`).
pub async fn resolve<G>(
    graph: &G,
    reference: &PostReference,
    ctx: &RunContext,
) -> Result<CanonicalPostUri, RaffleError>
where
    G: SocialGraph + ?Sized,
{
    if reference.author_is_did() {
        return Ok(CanonicalPostUri::new(
            &reference.author,
            &reference.record_key,
        ));
    }

    let handle = reference.author.as_str();
    let did = ctx
        .call(
            graph.resolve_handle(handle),
            |source| {
                if source.is_not_found() {
                    RaffleError::ResolutionFailed {
                        handle: handle.to_string(),
                        source,
                    }
                } else {
                    RaffleError::fetch(format!("DID for @{handle}"), source)
                }
            },
        )
        .await?;

    debug!(handle = handle, did = %did, "Resolved handle");

    Ok(CanonicalPostUri::new(&did, &reference.record_key))
}
