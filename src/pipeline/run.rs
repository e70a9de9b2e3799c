// End-to-end raffle run: resolve -> aggregate -> (filter) -> draw.
//
// Each stage is a plain async function of its inputs and the graph. The run
// owns its audience; nothing survives between runs.

use chrono::{DateTime, Utc};
use tracing::info;

use super::audience::{aggregate, EngagementFilters};
use super::collect::PAGE_SIZE;
use super::context::RunContext;
use super::reference::{resolve, PostReference};
use super::relationship::{
    retain_followers, DEFAULT_RELATIONSHIP_CONCURRENCY, RELATIONSHIP_BATCH_SIZE,
};
use super::sample::{pick_winner, SelectedParticipant};
use crate::bluesky::graph::SocialGraph;
use crate::error::RaffleError;

/// What the person running the raffle asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleRequest {
    pub post_url: String,
    pub filters: EngagementFilters,
    /// Only keep participants who follow the post's author.
    pub followers_only: bool,
}

/// Tuning knobs. The defaults match the public AppView's limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleOptions {
    pub page_size: usize,
    pub relationship_batch_size: usize,
    pub relationship_concurrency: usize,
    /// Collect likes and reposts concurrently instead of one after the other.
    pub parallel_collections: bool,
}

impl Default for RaffleOptions {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            relationship_batch_size: RELATIONSHIP_BATCH_SIZE,
            relationship_concurrency: DEFAULT_RELATIONSHIP_CONCURRENCY,
            parallel_collections: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RaffleOutcome {
    pub winner: SelectedParticipant,
    /// Qualifying participants the winner was drawn from.
    pub audience_size: usize,
    pub post_uri: String,
    pub drawn_at: DateTime<Utc>,
}

/// Run one raffle.
///
/// Usage errors (`NoFilterSelected`, `InvalidReference`) are reported before
/// any network call. An audience that is empty after aggregation fails with
/// `EmptyAudience` without spending relationship lookups on it.
pub async fn run<G>(
    graph: &G,
    request: &RaffleRequest,
    options: &RaffleOptions,
    ctx: &RunContext,
) -> Result<RaffleOutcome, RaffleError>
where
    G: SocialGraph + ?Sized,
{
    if !request.filters.any() {
        return Err(RaffleError::NoFilterSelected);
    }
    let reference = PostReference::parse(&request.post_url)?;

    let post_uri = resolve(graph, &reference, ctx).await?;
    info!(uri = %post_uri, "Resolved post");

    let mut audience = aggregate(
        graph,
        &post_uri,
        request.filters,
        options.page_size,
        options.parallel_collections,
        ctx,
    )
    .await?;

    if audience.is_empty() {
        return Err(RaffleError::EmptyAudience);
    }

    if request.followers_only {
        audience = retain_followers(
            graph,
            post_uri.author_did(),
            audience,
            options.relationship_batch_size,
            options.relationship_concurrency,
            ctx,
        )
        .await?;
    }

    let winner = pick_winner(graph, &audience, ctx).await?;

    Ok(RaffleOutcome {
        winner,
        audience_size: audience.len(),
        post_uri: post_uri.to_string(),
        drawn_at: Utc::now(),
    })
}
