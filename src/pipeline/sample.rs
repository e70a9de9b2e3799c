// Winner selection.

use rand::Rng;
use tracing::info;

use super::audience::Audience;
use super::context::RunContext;
use crate::bluesky::graph::SocialGraph;
use crate::error::RaffleError;

/// The drawn account, as shown to the person running the raffle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedParticipant {
    pub did: String,
    pub handle: String,
    pub avatar: Option<String>,
}

impl SelectedParticipant {
    pub fn profile_url(&self) -> String {
        format!("https://bsky.app/profile/{}", self.handle)
    }
}

/// Draw one member uniformly at random.
///
/// The audience is snapshotted once and the index drawn from `[0, len)`.
pub fn draw<'a, R>(audience: &'a Audience, rng: &mut R) -> Result<&'a str, RaffleError>
where
    R: Rng,
{
    let snapshot: Vec<&'a String> = audience.iter().collect();
    if snapshot.is_empty() {
        return Err(RaffleError::EmptyAudience);
    }

    let index = rng.random_range(0..snapshot.len());
    Ok(snapshot[index].as_str())
}

/// Draw a winner and look up their profile (one getProfile call).
pub async fn pick_winner<G>(
    graph: &G,
    audience: &Audience,
    ctx: &RunContext,
) -> Result<SelectedParticipant, RaffleError>
where
    G: SocialGraph + ?Sized,
{
    let did = draw(audience, &mut rand::rng())?.to_string();

    let profile = ctx
        .call(
            graph.get_profile(&did),
            |e| RaffleError::fetch(format!("profile for {did}"), e),
        )
        .await?;

    info!(did = %did, handle = %profile.handle, audience = audience.len(), "Winner drawn");

    Ok(SelectedParticipant {
        did,
        handle: profile.handle,
        avatar: profile.avatar,
    })
}
