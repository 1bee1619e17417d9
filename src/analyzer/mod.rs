//! Track analysis pipeline.
//!
//! A [`TrackAnalyzer`] owns one track and its summary for the duration of a
//! run and moves through fixed stages:
//!
//! `Init → Parsed → Distanced → Annotated → Summarized → Serialized`
//!
//! The annotation passes (slope, vertical velocity, power, velocity) may run
//! in any order once distances are set. Calling a step from the wrong stage
//! is an error rather than a silent no-op.

pub mod batch;
pub mod summary;

pub use batch::{analyze_batch, BatchFailure, BatchReport};
pub use summary::Summary;

use crate::metrics::{
    moving_data, simplify_track_elevation, windowed, AggregationMode, FilteredElevation,
    PowerCurveAnalyzer, SlopeMetric, VerticalVelocityMetric,
};
use crate::storage::{AnalyzerConfig, ConfigError};
use crate::track::writer::write_gpx_to_file;
use crate::track::{accumulate_distance, simplified_path, Track, TrackError};
use crate::velocity::{SplitError, VelocityCurve};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use summary::*;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Span};

/// Errors that can occur during an analysis run
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Track error: {0}")]
    Track(#[from] TrackError),

    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Summary error: {0}")]
    SummaryError(String),

    #[error("Cannot {operation} in stage {stage:?}")]
    InvalidStage { operation: &'static str, stage: Stage },
}

/// Pipeline stage of an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Stage {
    /// Created from a path, nothing read yet
    #[default]
    Init,
    /// Points loaded
    Parsed,
    /// Cumulative distances set
    Distanced,
    /// At least one annotation pass done
    Annotated,
    /// Summary assembled
    Summarized,
    /// Output files written
    Serialized,
}

/// Annotation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pass {
    Slope,
    VerticalVelocity,
    Power,
    Velocity,
}

/// Files written by [`TrackAnalyzer::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub track: PathBuf,
    pub summary: PathBuf,
    pub simplified: Option<PathBuf>,
}

/// Analysis run over one track.
pub struct TrackAnalyzer {
    source: Option<PathBuf>,
    track: Track,
    config: AnalyzerConfig,
    split_files: Vec<PathBuf>,
    mode: AggregationMode,
    stage: Stage,
    passes: BTreeSet<Pass>,
    summary: Summary,
    simplified: Option<FilteredElevation>,
    span: Span,
}

impl TrackAnalyzer {
    /// Analyzer for the GPX file at `path`; nothing is read until [`parse`](Self::parse).
    pub fn new(path: impl Into<PathBuf>, config: AnalyzerConfig) -> Self {
        let path = path.into();
        let span = info_span!("track", file = %path.display());
        Self {
            source: Some(path),
            track: Track::default(),
            config,
            split_files: Vec::new(),
            mode: AggregationMode::default(),
            stage: Stage::Init,
            passes: BTreeSet::new(),
            summary: Summary::new(),
            simplified: None,
            span,
        }
    }

    /// Analyzer for an already parsed track.
    pub fn from_track(track: Track, config: AnalyzerConfig) -> Self {
        let span = info_span!("track", name = track.name.as_deref().unwrap_or("unnamed"));
        Self {
            source: None,
            track,
            config,
            split_files: Vec::new(),
            mode: AggregationMode::default(),
            stage: Stage::Parsed,
            passes: BTreeSet::new(),
            summary: Summary::new(),
            simplified: None,
            span,
        }
    }

    /// Take velocity data from these split files instead of the track.
    pub fn with_split_files(mut self, split_files: Vec<PathBuf>) -> Self {
        self.split_files = split_files;
        self
    }

    /// Log every step inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub fn passes(&self) -> &BTreeSet<Pass> {
        &self.passes
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn require(&self, operation: &'static str, allowed: &[Stage]) -> Result<(), AnalyzerError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(AnalyzerError::InvalidStage {
                operation,
                stage: self.stage,
            })
        }
    }

    fn annotated(&mut self, pass: Pass) {
        self.passes.insert(pass);
        self.stage = Stage::Annotated;
    }

    /// Read the source file.
    pub fn parse(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("parse", &[Stage::Init])?;
        let Some(path) = self.source.as_deref() else {
            return Err(AnalyzerError::InvalidStage {
                operation: "parse without a source file",
                stage: self.stage,
            });
        };
        info!("Reading track file {}", path.display());
        self.track = Track::from_path(path)?;
        self.stage = Stage::Parsed;
        Ok(())
    }

    /// Set cumulative distances.
    pub fn set_distance(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("set distances", &[Stage::Parsed])?;
        let total = accumulate_distance(&mut self.track);
        info!("{} points, {:.0} m", self.track.len(), total);
        self.stage = Stage::Distanced;
        Ok(())
    }

    /// Slope of every distance window, attributed to its center point, and
    /// the steepest one as `slope_<interval>`.
    pub fn run_slope(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("run the slope pass", &[Stage::Distanced, Stage::Annotated])?;

        let interval = self.config.slope.interval_m;
        let metric = SlopeMetric::new(interval as f64, self.mode);
        let values: Vec<_> = windowed(&self.track.points, &metric).collect();
        for v in &values {
            self.track.points[v.center].annotations.slope = v.value;
        }

        let key = slope_key(interval);
        match values.iter().map(|v| v.value).reduce(f64::max) {
            Some(max) => self.summary.insert(key, max),
            None => debug!("No {} m slope window completed", interval),
        }
        debug!("{} slope windows in {:?} mode", values.len(), self.mode);

        self.annotated(Pass::Slope);
        Ok(())
    }

    /// Ascent and descent rates for every configured time window.
    ///
    /// Only the annotation window writes to the points. Summary maxima are
    /// `vertical_velocity_<w>s_+` and `vertical_velocity_<w>s_-`, both as
    /// magnitudes.
    pub fn run_vertical_velocity(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require(
            "run the vertical velocity pass",
            &[Stage::Distanced, Stage::Annotated],
        )?;

        let settings = &self.config.vertical_velocity;
        let mut windows = settings.windows_s.clone();
        if !windows.contains(&settings.annotate_window_s) {
            windows.push(settings.annotate_window_s);
        }
        let annotate = settings.annotate_window_s;
        let reported = settings.windows_s.clone();
        let filter = self.config.elevation.filter();

        for window_s in windows {
            let Some(metric) = VerticalVelocityMetric::for_points(
                &self.track.points,
                window_s as f64,
                filter,
                self.mode,
            ) else {
                warn!("No timed points, skipping vertical velocity");
                break;
            };
            let values: Vec<_> = windowed(&self.track.points, &metric).collect();
            debug!("{} windows of {} s", values.len(), window_s);

            if window_s == annotate {
                for v in &values {
                    let annotations = &mut self.track.points[v.center].annotations;
                    annotations.vertical_velocity_up = v.value.up;
                    annotations.vertical_velocity_down = v.value.down.abs();
                }
            }
            if reported.contains(&window_s) && !values.is_empty() {
                let up = values.iter().map(|v| v.value.up).fold(0.0, f64::max);
                let down = values.iter().map(|v| v.value.down).fold(0.0, f64::max);
                let (up_key, down_key) = vertical_velocity_keys(window_s);
                self.summary.insert(up_key, up);
                self.summary.insert(down_key, down.abs());
            }
        }

        self.annotated(Pass::VerticalVelocity);
        Ok(())
    }

    /// Power curve, average power and the per-point rolling average.
    pub fn run_power(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("run the power pass", &[Stage::Distanced, Stage::Annotated])?;

        let analyzer = PowerCurveAnalyzer::standard(self.config.power);
        match analyzer.analyze(&self.track.points) {
            Some(report) => {
                for (point, average) in self.track.points.iter_mut().zip(&report.point_averages) {
                    point.annotations.power_60s = *average;
                }
                self.summary
                    .insert_opt(KEY_POWER_AVG, report.power_avg.map(f64::from));
                for entry in &report.curve {
                    self.summary
                        .insert(power_key(&entry.label), entry.power_watts as f64);
                }
                info!("Power curve with {} durations", report.curve.len());
            }
            None => debug!("No usable power data"),
        }

        self.annotated(Pass::Power);
        Ok(())
    }

    /// Best average velocity over each configured distance.
    ///
    /// Uses the split files when given, else the track's own distances and
    /// times. Distances longer than the curve get no key.
    pub fn run_velocity(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("run the velocity pass", &[Stage::Distanced, Stage::Annotated])?;

        let curve = if self.split_files.is_empty() {
            VelocityCurve::from_points(&self.track.points)
        } else {
            info!("Reading {} split files", self.split_files.len());
            VelocityCurve::from_split_files(&self.split_files)?
        };
        debug!("Velocity curve covers {:.0} m", curve.total_distance());

        for km in &self.config.velocity.distances_km {
            self.summary.insert_opt(
                velocity_key(*km),
                curve.average_velocity_for_kilometers(*km as f64),
            );
        }

        self.annotated(Pass::Velocity);
        Ok(())
    }

    /// Track-level values: duration, elevation range and totals, moving data
    /// and heart rate.
    pub fn summarize(&mut self) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("summarize", &[Stage::Distanced, Stage::Annotated])?;

        let points = &self.track.points;
        self.summary.insert(KEY_NUMBER_POINTS, points.len() as f64);
        self.summary.insert_opt(KEY_DURATION, self.track.duration_secs());

        let elevations = points.iter().filter_map(|p| p.elevation);
        self.summary
            .insert_opt(KEY_MIN_ELEVATION, elevations.clone().reduce(f64::min));
        self.summary
            .insert_opt(KEY_MAX_ELEVATION, elevations.reduce(f64::max));

        let simplified = simplify_track_elevation(points, &self.config.elevation.filter());
        if !simplified.samples.is_empty() {
            self.summary.insert(KEY_ELEVATION_GAIN, simplified.gain);
            self.summary.insert(KEY_ELEVATION_LOSS, simplified.loss);
        }

        if self.track.duration_secs().is_some() {
            let moving = moving_data(&self.track, &self.config.moving);
            self.summary.insert(KEY_MOVING_TIME, moving.moving_time);
            self.summary.insert(KEY_MOVING_DISTANCE, moving.moving_distance);
            self.summary.insert_opt(KEY_MAX_SPEED, moving.max_speed);
        }

        let heart_rates: Vec<f64> = points
            .iter()
            .filter_map(|p| p.annotations.heart_rate.map(f64::from))
            .collect();
        if !heart_rates.is_empty() {
            let avg = heart_rates.iter().sum::<f64>() / heart_rates.len() as f64;
            self.summary.insert(KEY_HEART_RATE_AVG, avg);
            self.summary
                .insert_opt(KEY_HEART_RATE_MAX, heart_rates.iter().copied().reduce(f64::max));
        }

        self.simplified = Some(simplified);
        info!("Summary with {} values", self.summary.len());
        self.stage = Stage::Summarized;
        Ok(())
    }

    /// Write the annotated track to `output`, the summary next to it as
    /// `<stem>.json`, and the simplified track when configured.
    pub fn write(&mut self, output: &Path) -> Result<WrittenFiles, AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.require("write", &[Stage::Summarized])?;

        write_gpx_to_file(&self.track, output)?;
        info!("Wrote annotated track to {}", output.display());

        let summary_path = output.with_extension("json");
        let json = self
            .summary
            .to_json(self.config.output.decimals)
            .map_err(|e| AnalyzerError::SummaryError(e.to_string()))?;
        std::fs::write(&summary_path, json).map_err(TrackError::from)?;

        let simplified = if self.config.output.write_simplified {
            let path = simplified_path(output);
            write_gpx_to_file(&self.simplified_track(), &path)?;
            info!("Wrote simplified track to {}", path.display());
            Some(path)
        } else {
            None
        };

        self.stage = Stage::Serialized;
        Ok(WrittenFiles {
            track: output.to_path_buf(),
            summary: summary_path,
            simplified,
        })
    }

    /// Points kept by the whole-track elevation filter, as a single segment.
    pub fn simplified_track(&self) -> Track {
        let filtered = match &self.simplified {
            Some(filtered) => filtered.clone(),
            None => simplify_track_elevation(&self.track.points, &self.config.elevation.filter()),
        };
        let points = filtered
            .samples
            .iter()
            .map(|s| self.track.points[s.index].clone())
            .collect();
        let mut track = Track::from_points(self.track.name.clone(), points);
        track.time = self.track.time;
        track
    }

    /// Run every step up to the summary.
    ///
    /// `force_fallback` switches the slope and vertical velocity windows
    /// from regression and smoothing to plain first-to-last ratios.
    pub fn analyze(&mut self, force_fallback: bool) -> Result<(), AnalyzerError> {
        let _guard = self.span.clone().entered();
        self.mode = if force_fallback {
            AggregationMode::Ratio
        } else {
            AggregationMode::Smoothed
        };

        if self.stage == Stage::Init {
            self.parse()?;
        }
        self.set_distance()?;
        self.run_slope()?;
        self.run_vertical_velocity()?;
        self.run_power()?;
        self.run_velocity()?;
        self.summarize()
    }

    /// Whether the regression run found no slope on a track that clearly
    /// climbs.
    pub fn needs_fallback(&self) -> bool {
        let slope = self.summary.get(&slope_key(self.config.slope.interval_m));
        if slope.is_some_and(|s| s != 0.0) {
            return false;
        }
        let gain = match &self.simplified {
            Some(filtered) => filtered.gain,
            None => {
                simplify_track_elevation(&self.track.points, &self.config.elevation.filter()).gain
            }
        };
        gain >= self.config.elevation.minimal_delta_m
    }

    /// Forget every computed annotation and summary value.
    ///
    /// Parsed points and decoded sensor readings are kept, so the analyzer
    /// returns to [`Stage::Parsed`].
    pub fn reset(&mut self) -> Result<(), AnalyzerError> {
        self.require(
            "reset",
            &[Stage::Distanced, Stage::Annotated, Stage::Summarized],
        )?;
        for point in &mut self.track.points {
            point.annotations.reset_computed();
        }
        self.summary.clear();
        self.passes.clear();
        self.simplified = None;
        self.stage = Stage::Parsed;
        Ok(())
    }

    /// Analyze with regression first and re-run in ratio mode when
    /// [`needs_fallback`](Self::needs_fallback) holds afterwards.
    ///
    /// Returns whether the fallback run was used.
    pub fn analyze_with_fallback(&mut self) -> Result<bool, AnalyzerError> {
        self.analyze(false)?;
        if !self.needs_fallback() {
            return Ok(false);
        }
        {
            let _guard = self.span.clone().entered();
            info!("No slope found on a climbing track, re-running with ratios");
        }
        self.reset()?;
        self.analyze(true)?;
        Ok(true)
    }
}
