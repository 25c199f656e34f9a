// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod similarity;
pub mod statistics;
pub mod time_patterns;

pub use similarity::SimilarityGrouper;
pub use statistics::StatisticalAnalyzer;
pub use time_patterns::{TimePattern, TimePatternAnalyzer};
