// Raffle: roll a random Bluesky user from a post's audience.
//
// This is the library root. `pipeline` holds the raffle stages, `bluesky` the
// public API client it runs against.

pub mod bluesky;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
