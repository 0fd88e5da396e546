pub mod config;
pub mod engine;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod pool;
pub mod reader;
pub mod results;
pub mod search;
pub mod walk;

pub use config::{CliOverrides, EncodingMode, ScanConfig};
pub use engine::{scan, Scanner};
pub use errors::{SearchError, SearchResult};
pub use pool::{BoundedWorkerPool, IsolatedSubstrate, LightweightSubstrate, Substrate, SubstrateKind};
pub use results::{collect, Comparison, ResultSet, ScanReport};
pub use search::{MatchResult, PatternMatcher, SearchTask, TaskOutcome};
