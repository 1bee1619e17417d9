//! Track model, GPX codec and distance accumulation.
//!
//! This module provides the point model shared by every analysis pass,
//! reading and writing GPX files, and merging several recordings into one
//! continuous track.

pub mod annotations;
pub mod distance;
pub mod gpx;
pub mod merge;
pub mod writer;

pub use annotations::Annotations;
pub use distance::{accumulate_distance, distance_3d, haversine_distance};
pub use merge::{merge_track_files, merge_tracks};

use chrono::{DateTime, Utc};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix appended to the file stem of simplified track exports.
pub const SIMPLIFIED_SUFFIX: &str = "_simplified";

/// Errors that can occur while reading or writing tracks
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No track points found")]
    Empty,

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One GPS sample plus the annotations computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Recording time
    pub time: Option<DateTime<Utc>>,
    /// GPS latitude
    pub latitude: f64,
    /// GPS longitude
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: Option<f64>,
    /// Per-point annotations
    pub annotations: Annotations,
}

impl TrackPoint {
    /// Create a point without time, elevation or annotations.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            time: None,
            latitude,
            longitude,
            elevation: None,
            annotations: Annotations::default(),
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Whether latitude and longitude can take part in distance math.
    pub fn has_position(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Seconds elapsed from `earlier` to this point, if both carry a time.
    pub fn seconds_since(&self, earlier: &TrackPoint) -> Option<f64> {
        match (self.time, earlier.time) {
            (Some(t), Some(e)) => Some((t - e).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}

/// Shape of one `<trk>` element: its name and the length of each segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackLayout {
    pub name: Option<String>,
    pub segment_lens: Vec<usize>,
}

/// A parsed recording: flat point sequence plus the layout needed to write
/// tracks and segments back out.
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// Name written to the GPX metadata
    pub name: Option<String>,
    /// Metadata time, if the file declared one
    pub time: Option<DateTime<Utc>>,
    /// All points in document order
    pub points: Vec<TrackPoint>,
    /// One entry per `<trk>`
    pub layout: Vec<TrackLayout>,
}

impl Track {
    /// Build a single-track, single-segment track from points.
    pub fn from_points(name: Option<String>, points: Vec<TrackPoint>) -> Self {
        let layout = vec![TrackLayout {
            name: name.clone(),
            segment_lens: vec![points.len()],
        }];
        Self {
            name,
            time: None,
            points,
            layout,
        }
    }

    /// Read and parse a GPX file from disk.
    pub fn from_path(path: &Path) -> Result<Self, TrackError> {
        if !path.exists() {
            return Err(TrackError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read(path)?;
        gpx::parse_gpx(&content)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index ranges of every segment, in document order.
    pub fn segment_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for len in self.layout.iter().flat_map(|t| t.segment_lens.iter()) {
            ranges.push(start..start + len);
            start += len;
        }
        if start < self.points.len() {
            // Points appended without a layout entry form one trailing segment
            ranges.push(start..self.points.len());
        }
        ranges
    }

    /// Time of the recording start: metadata time, else the first timed point.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.time
            .or_else(|| self.points.iter().find_map(|p| p.time))
    }

    /// Cumulative distance of the last point (0 for an empty track).
    pub fn final_distance(&self) -> f64 {
        self.points
            .last()
            .map(|p| p.annotations.distance)
            .unwrap_or(0.0)
    }

    /// Seconds between the first and last timed point.
    pub fn duration_secs(&self) -> Option<f64> {
        let first = self.points.iter().find(|p| p.time.is_some())?;
        let last = self.points.iter().rev().find(|p| p.time.is_some())?;
        last.seconds_since(first)
    }
}

/// Path of the simplified export next to `path`: `ride.gpx` → `ride_simplified.gpx`.
pub fn simplified_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("track");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("gpx");
    path.with_file_name(format!("{}{}.{}", stem, SIMPLIFIED_SUFFIX, ext))
}
