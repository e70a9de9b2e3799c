// In-memory SocialGraph for driving the pipeline without network access.
//
// Every call is recorded (when the request future first runs) so tests can
// assert exactly which lookups a stage made.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use raffle::bluesky::graph::{Page, Profile, Relationship, SocialGraph, XrpcError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ResolveHandle(String),
    Likes { uri: String, cursor: Option<String> },
    Reposts { uri: String, cursor: Option<String> },
    Relationships { subject: String, others: Vec<String> },
    Profile(String),
}

#[derive(Default)]
pub struct FakeGraph {
    pub handles: HashMap<String, String>,
    pub like_pages: Vec<Page<String>>,
    pub repost_pages: Vec<Page<String>>,
    /// Candidates whose relationship record says they follow the subject.
    pub followers: HashSet<String>,
    /// Candidates left out of relationship responses entirely.
    pub omitted: HashSet<String>,
    /// Every call to this NSID fails, with `fail_status` (502 when unset).
    pub fail_on: Option<&'static str>,
    pub fail_status: Option<u16>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<Call>>,
}

/// Build pages from item lists. Every page but the last carries a cursor
/// (`page-1`, `page-2`, ...); `trailing_cursor` gives the last one a cursor too.
pub fn pages(items: Vec<Vec<String>>, trailing_cursor: bool) -> Vec<Page<String>> {
    let count = items.len();
    items
        .into_iter()
        .enumerate()
        .map(|(i, items)| Page {
            items,
            cursor: (i + 1 < count || trailing_cursor).then(|| format!("page-{}", i + 1)),
        })
        .collect()
}

pub fn ids(prefix: &str, range: std::ops::RangeInclusive<u32>) -> Vec<String> {
    range.map(|i| format!("{prefix}{i}")).collect()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn failure(nsid: &str, status: u16) -> XrpcError {
    XrpcError::Status {
        nsid: nsid.to_string(),
        status,
        error: None,
        message: format!("HTTP {status}"),
    }
}

impl FakeGraph {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    async fn enter(&self, nsid: &str, call: Call) -> Result<(), XrpcError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(nsid) {
            return Err(failure(nsid, self.fail_status.unwrap_or(502)));
        }
        Ok(())
    }

    fn page(pages: &[Page<String>], cursor: Option<&str>) -> Page<String> {
        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .expect("fake only hands out page-N cursors"),
        };
        pages.get(index).cloned().unwrap_or(Page {
            items: Vec::new(),
            cursor: None,
        })
    }
}

#[async_trait]
impl SocialGraph for FakeGraph {
    async fn resolve_handle(&self, handle: &str) -> Result<String, XrpcError> {
        self.enter(
            "com.atproto.identity.resolveHandle",
            Call::ResolveHandle(handle.to_string()),
        )
        .await?;
        self.handles
            .get(handle)
            .cloned()
            .ok_or_else(|| XrpcError::Status {
                nsid: "com.atproto.identity.resolveHandle".to_string(),
                status: 400,
                error: Some("InvalidRequest".to_string()),
                message: "Unable to resolve handle".to_string(),
            })
    }

    async fn list_likers(
        &self,
        post_uri: &str,
        cursor: Option<&str>,
        _limit: usize,
    ) -> Result<Page<String>, XrpcError> {
        self.enter(
            "app.bsky.feed.getLikes",
            Call::Likes {
                uri: post_uri.to_string(),
                cursor: cursor.map(str::to_string),
            },
        )
        .await?;
        Ok(Self::page(&self.like_pages, cursor))
    }

    async fn list_reposters(
        &self,
        post_uri: &str,
        cursor: Option<&str>,
        _limit: usize,
    ) -> Result<Page<String>, XrpcError> {
        self.enter(
            "app.bsky.feed.getRepostedBy",
            Call::Reposts {
                uri: post_uri.to_string(),
                cursor: cursor.map(str::to_string),
            },
        )
        .await?;
        Ok(Self::page(&self.repost_pages, cursor))
    }

    async fn get_relationships(
        &self,
        subject: &str,
        others: &[String],
    ) -> Result<Vec<Relationship>, XrpcError> {
        self.enter(
            "app.bsky.graph.getRelationships",
            Call::Relationships {
                subject: subject.to_string(),
                others: others.to_vec(),
            },
        )
        .await?;

        // Reversed, so callers can't rely on response order.
        Ok(others
            .iter()
            .rev()
            .filter(|did| !self.omitted.contains(*did))
            .map(|did| Relationship::Known {
                did: did.clone(),
                followed_by: self.followers.contains(did),
            })
            .collect())
    }

    async fn get_profile(&self, did: &str) -> Result<Profile, XrpcError> {
        self.enter("app.bsky.actor.getProfile", Call::Profile(did.to_string()))
            .await?;
        Ok(Profile {
            handle: format!("{did}.test"),
            avatar: Some(format!("https://cdn.example/{did}.jpg")),
        })
    }
}
