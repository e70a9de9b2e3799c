// Followers-only filtering via batched getRelationships lookups.
//
// The audience is snapshotted in order, chunked into batches of 30, and each
// batch is checked against the post author. A candidate survives only when
// the response positively says they follow the author. Missing, not-found and
// unrecognised records all drop the candidate.

use std::collections::HashSet;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use super::audience::Audience;
use super::context::RunContext;
use crate::bluesky::graph::{Relationship, SocialGraph};
use crate::error::RaffleError;

/// Candidates per getRelationships call (the API maximum).
pub const RELATIONSHIP_BATCH_SIZE: usize = 30;

/// Batches in flight at once.
pub const DEFAULT_RELATIONSHIP_CONCURRENCY: usize = 4;

/// Members of `batch` that the response confirms follow the subject.
///
/// Records are matched by DID, not position, and records for DIDs outside
/// the batch are ignored.
pub fn confirmed_followers(batch: &[String], records: &[Relationship]) -> Vec<String> {
    let requested: HashSet<&str> = batch.iter().map(String::as_str).collect();

    let followers: HashSet<&str> = records
        .iter()
        .filter_map(|record| match record {
            Relationship::Known {
                did,
                followed_by: true,
                ..
            } => Some(did.as_str()),
            _ => None,
        })
        .filter(|did| requested.contains(did))
        .collect();

    let unknown = records
        .iter()
        .filter(|r| matches!(r, Relationship::Unknown))
        .count();
    if unknown > 0 {
        warn!(
            unknown = unknown,
            batch_size = batch.len(),
            "Dropping candidates with unrecognised relationship records"
        );
    }

    batch
        .iter()
        .filter(|did| followers.contains(did.as_str()))
        .cloned()
        .collect()
}

/// Keep only audience members who follow `author_did`.
///
/// Up to `concurrency` batches are in flight at once. Any failed batch fails
/// the whole filter; nothing is removed from the audience unless every batch
/// succeeded.
pub async fn retain_followers<G>(
    graph: &G,
    author_did: &str,
    audience: Audience,
    batch_size: usize,
    concurrency: usize,
    ctx: &RunContext,
) -> Result<Audience, RaffleError>
where
    G: SocialGraph + ?Sized,
{
    let members: Vec<String> = audience.into_iter().collect();
    let batches: Vec<&[String]> = members.chunks(batch_size.max(1)).collect();
    let batch_count = batches.len();

    let kept: Vec<Vec<String>> = stream::iter(batches.into_iter().enumerate())
        .map(move |(index, batch)| async move {
            let records = ctx
                .call(
                    graph.get_relationships(author_did, batch),
                    |e| RaffleError::fetch(format!("relationships (batch {})", index + 1), e),
                )
                .await?;

            let followers = confirmed_followers(batch, &records);
            debug!(
                batch = index + 1,
                requested = batch.len(),
                kept = followers.len(),
                "Checked relationship batch"
            );
            Ok::<_, RaffleError>(followers)
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    let filtered: Audience = kept.into_iter().flatten().collect();

    info!(
        before = members.len(),
        after = filtered.len(),
        batches = batch_count,
        "Applied followers-only filter"
    );

    Ok(filtered)
}
