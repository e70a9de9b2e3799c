// The raffle pipeline.
//
// Stages, in call order:
//   reference   : post URL -> canonical at:// URI (resolving the handle)
//   audience    : likers / reposters, collected page by page and combined
//   relationship: optional followers-only filter, batched
//   sample      : uniform draw and profile lookup
// `run` chains them under one RunContext.

pub mod audience;
pub mod collect;
pub mod context;
pub mod reference;
pub mod relationship;
pub mod run;
pub mod sample;

pub use audience::{Audience, EngagementFilters};
pub use context::RunContext;
pub use run::{run, RaffleOptions, RaffleOutcome, RaffleRequest};
pub use sample::SelectedParticipant;
