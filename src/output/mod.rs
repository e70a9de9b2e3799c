// Output formatting for raffle results.

pub mod terminal;

use crate::pipeline::RaffleRequest;

/// Human-readable summary of which participants qualify,
/// e.g. "liked and reposted, following the author".
pub fn describe_criteria(request: &RaffleRequest) -> String {
    let engagement = match (request.filters.liked, request.filters.reposted) {
        (true, true) => "liked and reposted",
        (true, false) => "liked",
        (false, true) => "reposted",
        (false, false) => "no engagement filter",
    };

    if request.followers_only {
        format!("{engagement}, following the author")
    } else {
        engagement.to_string()
    }
}
