//! TrackAnalyzer - GPX track analysis
//!
//! Reads GPS recordings and annotates every point with cumulative distance,
//! slope, vertical velocity and rolling power. Summarizes a track with
//! elevation totals, moving data, power curve and best average velocities
//! over fixed distances, and writes the annotated track, the summary and an
//! optional elevation-simplified track.

pub mod analyzer;
pub mod integrations;
pub mod metrics;
pub mod storage;
pub mod track;
pub mod velocity;

// Re-export commonly used types
pub use analyzer::{analyze_batch, AnalyzerError, BatchReport, Stage, Summary, TrackAnalyzer};
pub use integrations::{ActivityProvider, DirectoryProvider, ProviderError};
pub use storage::config::AnalyzerConfig;
pub use track::{merge_tracks, Track, TrackError, TrackPoint};
pub use velocity::VelocityCurve;
