//! Clients for external collaborators: the shared stats cache and the
//! match results sink. Both are optional and the simulation tolerates
//! either being slow or down.

pub mod results;
pub mod stats_cache;

pub use results::ResultsStore;
pub use stats_cache::StatsCacheClient;
