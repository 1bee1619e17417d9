//! Merge several recordings of one outing into a single track.

use super::distance::accumulate_distance;
use super::writer::write_gpx_to_file;
use super::{Track, TrackError, TrackLayout};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::info;

/// Merge tracks into one named track.
///
/// Tracks are ordered by start time (tracks without any time go last, in
/// their given order). Each track's distances are accumulated and then
/// rebased by the final distance of the track before it, so the merged
/// distance runs on without resetting. Segments and per-track layout are
/// preserved.
pub fn merge_tracks(mut tracks: Vec<Track>, name: &str) -> Result<Track, TrackError> {
    tracks.retain(|t| !t.is_empty());
    if tracks.is_empty() {
        return Err(TrackError::Empty);
    }
    tracks.sort_by_key(|t| t.start_time().unwrap_or(DateTime::<Utc>::MAX_UTC));

    let time = tracks.first().and_then(|t| t.start_time());
    let mut merged = Track {
        name: Some(name.to_string()),
        time,
        points: Vec::new(),
        layout: Vec::new(),
    };

    let mut offset = 0.0;
    for mut track in tracks {
        let length = accumulate_distance(&mut track);
        for point in &mut track.points {
            point.annotations.distance += offset;
        }
        offset += length;
        // Layout must describe exactly the points it covers
        if track.layout.iter().map(|l| l.segment_lens.iter().sum::<usize>()).sum::<usize>()
            != track.points.len()
        {
            track.layout = vec![TrackLayout {
                name: track.name.clone(),
                segment_lens: vec![track.points.len()],
            }];
        }
        merged.layout.extend(track.layout);
        merged.points.extend(track.points);
    }

    info!(
        "Merged {} tracks into '{}' with {} points, {:.0} m",
        merged.layout.len(),
        name,
        merged.len(),
        offset
    );
    Ok(merged)
}

/// Read GPX files, merge them and write the result to `output`.
pub fn merge_track_files<P: AsRef<Path>>(
    inputs: &[P],
    output: &Path,
    name: &str,
) -> Result<Track, TrackError> {
    let tracks = inputs
        .iter()
        .map(|p| Track::from_path(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_tracks(tracks, name)?;
    write_gpx_to_file(&merged, output)?;
    info!("Wrote merged track to {}", output.display());
    Ok(merged)
}
