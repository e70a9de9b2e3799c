// Audience aggregation: likers and/or reposters of one post.
//
// Each requested engagement type is collected in full and turned into a set;
// when both are requested the audience is their intersection.

use std::collections::BTreeSet;

use tracing::info;

use super::collect::collect_pages;
use super::context::RunContext;
use super::reference::CanonicalPostUri;
use crate::bluesky::graph::SocialGraph;
use crate::error::RaffleError;

/// Candidate DIDs. Ordered so that batching and sampling snapshots are stable.
pub type Audience = BTreeSet<String>;

/// Which engagement types a participant must have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementFilters {
    pub liked: bool,
    pub reposted: bool,
}

impl EngagementFilters {
    pub fn any(&self) -> bool {
        self.liked || self.reposted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Likes,
    Reposts,
}

impl Engagement {
    pub fn nsid(self) -> &'static str {
        match self {
            Self::Likes => "app.bsky.feed.getLikes",
            Self::Reposts => "app.bsky.feed.getRepostedBy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Likes => "likes",
            Self::Reposts => "reposts",
        }
    }
}

/// Combine the collected sets.
///
/// Both present: intersection. One present: that set. Neither: the caller
/// asked for an audience without any filter.
pub fn combine(likers: Option<Audience>, reposters: Option<Audience>) -> Result<Audience, RaffleError> {
    match (likers, reposters) {
        (Some(likers), Some(reposters)) => Ok(likers.intersection(&reposters).cloned().collect()),
        (Some(only), None) | (None, Some(only)) => Ok(only),
        (None, None) => Err(RaffleError::NoFilterSelected),
    }
}

/// Collect every account with the given engagement on the post.
/// Duplicates across pages collapse into one entry.
pub async fn collect_engagement<G>(
    graph: &G,
    post_uri: &CanonicalPostUri,
    engagement: Engagement,
    page_size: usize,
    ctx: &RunContext,
) -> Result<Audience, RaffleError>
where
    G: SocialGraph + ?Sized,
{
    let uri = post_uri.as_str();
    let dids = collect_pages(engagement.label(), page_size, move |cursor| async move {
        let request = match engagement {
            Engagement::Likes => graph.list_likers(uri, cursor.as_deref(), page_size),
            Engagement::Reposts => graph.list_reposters(uri, cursor.as_deref(), page_size),
        };
        ctx.call(request, |e| RaffleError::fetch(engagement.label(), e))
            .await
    })
    .await?;

    let fetched = dids.len();
    let audience: Audience = dids.into_iter().collect();

    info!(
        engagement = engagement.label(),
        nsid = engagement.nsid(),
        fetched = fetched,
        unique = audience.len(),
        uri = uri,
        "Collected engagement"
    );

    Ok(audience)
}

/// Build the audience for the selected filters.
///
/// With `parallel` set the two collections run concurrently; otherwise
/// reposts are collected after likes.
pub async fn aggregate<G>(
    graph: &G,
    post_uri: &CanonicalPostUri,
    filters: EngagementFilters,
    page_size: usize,
    parallel: bool,
    ctx: &RunContext,
) -> Result<Audience, RaffleError>
where
    G: SocialGraph + ?Sized,
{
    if !filters.any() {
        return Err(RaffleError::NoFilterSelected);
    }

    let collect_if = move |wanted: bool, engagement: Engagement| async move {
        if wanted {
            collect_engagement(graph, post_uri, engagement, page_size, ctx)
                .await
                .map(Some)
        } else {
            Ok(None)
        }
    };

    let likes = collect_if(filters.liked, Engagement::Likes);
    let reposts = collect_if(filters.reposted, Engagement::Reposts);

    let (likers, reposters) = if parallel {
        futures::try_join!(likes, reposts)?
    } else {
        (likes.await?, reposts.await?)
    };

    combine(likers, reposters)
}
