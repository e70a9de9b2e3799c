// Public AT Protocol client: unauthenticated XRPC over HTTP.
//
// Everything the raffle reads (handles, likes, reposts, relationships,
// profiles) is served by the public AppView without a session, so this is
// a thin reqwest wrapper with a generic XRPC GET helper.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use atrium_api::app::bsky::actor::get_profile;
use atrium_api::app::bsky::feed::{get_likes, get_reposted_by};
use atrium_api::app::bsky::graph::get_relationships::{self, OutputRelationshipsItem};
use atrium_api::types::string::AtIdentifier;
use atrium_api::types::Union;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::graph::{Page, Profile, Relationship, SocialGraph, XrpcError};
use super::rate_limit::{with_retry, RateLimiter};

/// Default public API endpoint for AT Protocol read operations.
pub const DEFAULT_PUBLIC_API_URL: &str = "https://public.api.bsky.app";

/// Upper bound for a single HTTP attempt.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Unauthenticated HTTP client for public AT Protocol XRPC endpoints.
pub struct PublicAtpClient {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
    attempt_timeout: Duration,
}

impl PublicAtpClient {
    /// Create a new public API client pointing at the given base URL.
    ///
    /// `attempt_timeout` bounds each HTTP attempt; rate-limit waits and
    /// 429 backoff are not counted against it.
    pub fn new(base_url: &str, attempt_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("raffle/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::default(),
            attempt_timeout,
        })
    }

    /// GET an XRPC endpoint and deserialize the response, retrying on 429.
    ///
    /// Use repeated keys for array parameters
    /// (e.g. `[("others", "did1"), ("others", "did2")]`).
    pub async fn xrpc_get<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, &str)],
    ) -> Result<T, XrpcError> {
        with_retry(&self.rate_limiter, self.attempt_timeout, nsid, || {
            self.xrpc_get_once(nsid, params)
        })
        .await
    }

    async fn xrpc_get_once<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, &str)],
    ) -> Result<T, XrpcError> {
        let url = format!("{}/xrpc/{}", self.base_url, nsid);

        debug!(nsid = nsid, "XRPC GET request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| XrpcError::Transport {
                nsid: nsid.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(nsid, status.as_u16(), &body));
        }

        response.json::<T>().await.map_err(|source| XrpcError::Decode {
            nsid: nsid.to_string(),
            source,
        })
    }
}

/// Query parameters for one page of a post engagement listing.
fn page_params<'a>(
    post_uri: &'a str,
    cursor: Option<&'a str>,
    limit: &'a str,
) -> Vec<(&'a str, &'a str)> {
    let mut params = vec![("uri", post_uri), ("limit", limit)];
    if let Some(c) = cursor {
        params.push(("cursor", c));
    }
    params
}

/// Build a `Status` error, pulling `error`/`message` out of the XRPC error
/// body when there is one.
fn status_error(nsid: &str, status: u16, body: &str) -> XrpcError {
    let parsed: Option<XrpcErrorBody> = serde_json::from_str(body).ok();
    let (error, message) = match parsed {
        Some(b) => (b.error, b.message.unwrap_or_else(|| body.to_string())),
        None => (None, body.to_string()),
    };
    XrpcError::Status {
        nsid: nsid.to_string(),
        status,
        error,
        message,
    }
}

/// Flatten a `getRelationships` response into `Relationship`s.
///
/// Union members this version of the lexicon doesn't know about come back
/// as `Relationship::Unknown`.
pub fn relationships_from_output(output: get_relationships::Output) -> Vec<Relationship> {
    output
        .data
        .relationships
        .into_iter()
        .map(|item| match item {
            Union::Refs(OutputRelationshipsItem::AppBskyGraphDefsRelationship(rel)) => {
                Relationship::Known {
                    did: rel.did.as_str().to_string(),
                    followed_by: rel.followed_by.is_some(),
                }
            }
            Union::Refs(OutputRelationshipsItem::AppBskyGraphDefsNotFoundActor(nf)) => {
                let actor = match &nf.actor {
                    AtIdentifier::Did(did) => did.as_str().to_string(),
                    AtIdentifier::Handle(handle) => handle.as_str().to_string(),
                };
                Relationship::NotFound { actor }
            }
            Union::Unknown(unknown) => {
                warn!(record = ?unknown, "Unknown relationship record type");
                Relationship::Unknown
            }
        })
        .collect()
}

#[async_trait]
impl SocialGraph for PublicAtpClient {
    async fn resolve_handle(&self, handle: &str) -> Result<String, XrpcError> {
        let resp: ResolveHandleResponse = self
            .xrpc_get("com.atproto.identity.resolveHandle", &[("handle", handle)])
            .await?;
        Ok(resp.did)
    }

    async fn list_likers(
        &self,
        post_uri: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<String>, XrpcError> {
        let limit = limit.to_string();
        let output: get_likes::Output = self
            .xrpc_get(
                "app.bsky.feed.getLikes",
                &page_params(post_uri, cursor, &limit),
            )
            .await?;

        Ok(Page {
            items: output
                .likes
                .iter()
                .map(|like| like.actor.did.as_str().to_string())
                .collect(),
            cursor: output.data.cursor.clone(),
        })
    }

    async fn list_reposters(
        &self,
        post_uri: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page<String>, XrpcError> {
        let limit = limit.to_string();
        let output: get_reposted_by::Output = self
            .xrpc_get(
                "app.bsky.feed.getRepostedBy",
                &page_params(post_uri, cursor, &limit),
            )
            .await?;

        Ok(Page {
            items: output
                .reposted_by
                .iter()
                .map(|profile| profile.did.as_str().to_string())
                .collect(),
            cursor: output.data.cursor.clone(),
        })
    }

    async fn get_relationships(
        &self,
        subject: &str,
        others: &[String],
    ) -> Result<Vec<Relationship>, XrpcError> {
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(others.len() + 1);
        params.push(("actor", subject));
        params.extend(others.iter().map(|did| ("others", did.as_str())));

        let output: get_relationships::Output = self
            .xrpc_get("app.bsky.graph.getRelationships", &params)
            .await?;
        Ok(relationships_from_output(output))
    }

    async fn get_profile(&self, did: &str) -> Result<Profile, XrpcError> {
        let output: get_profile::Output = self
            .xrpc_get("app.bsky.actor.getProfile", &[("actor", did)])
            .await?;
        Ok(Profile {
            handle: output.handle.as_str().to_string(),
            avatar: output.avatar.clone(),
        })
    }
}

// -- Serde types for endpoints without a typed output we use --

#[derive(Deserialize)]
struct ResolveHandleResponse {
    did: String,
}

#[derive(Deserialize)]
struct XrpcErrorBody {
    error: Option<String>,
    message: Option<String>,
}
