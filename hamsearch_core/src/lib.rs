pub mod cancel;
pub mod config;
pub mod hash;
pub mod hex_codec;
pub mod mutator;
pub mod report;
pub mod scorer;
pub mod search;
pub mod stats;

pub use cancel::CancelToken;
pub use config::{ConfigError, SearchConfig, ValidatedConfig};
pub use hash::{HashAlgorithm, HashError, HashFunction};
pub use mutator::{Chunk, MutationPass, ScoredCandidate, ScoredPass, mutate_and_score};
pub use report::{DurableWrite, Reporter};
pub use scorer::{Scorer, hamming_distance};
pub use search::{BestScore, SearchError, SearchSession, StopReason};
pub use stats::{Counters, RunStats, SearchProgress};
