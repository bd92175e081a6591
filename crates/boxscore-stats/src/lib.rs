// Box-score ingestion, normalization, metric derivation and leaderboards.

pub mod leaderboard;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod source;
