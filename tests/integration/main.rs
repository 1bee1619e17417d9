//! Integration test modules.

mod analyze_track_test;
mod batch_test;
mod common;
mod merge_tracks_test;
mod provider_test;
