// Bluesky API access: the public XRPC client and the trait the raffle
// pipeline is written against.
//
// Built on reqwest and atrium-api's lexicon types. Everything is read-only
// and unauthenticated.

pub mod client;
pub mod graph;
pub mod rate_limit;
