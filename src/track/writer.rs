//! GPX serialization with annotation extensions.
//!
//! Every point gets a `gpxtpx:TrackPointExtension` block holding the pairs
//! produced by [`Annotations::encode`](super::Annotations::encode).

use super::{Track, TrackError, TrackPoint};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// GPX 1.1 namespace
const NS_GPX: &str = "http://www.topografix.com/GPX/1/1";
/// Garmin track point extension namespace
const NS_GPXTPX: &str = "http://www.garmin.com/xmlschemas/TrackPointExtension/v1";
const CREATOR: &str = "trackanalyzer";

/// Serialize a track to a GPX 1.1 document.
pub fn write_gpx(track: &Track) -> Result<String, TrackError> {
    if track.is_empty() {
        return Err(TrackError::Empty);
    }

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| TrackError::XmlError(e.to_string()))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", CREATOR));
    root.push_attribute(("xmlns", NS_GPX));
    root.push_attribute(("xmlns:gpxtpx", NS_GPXTPX));
    start(&mut writer, root)?;

    if track.name.is_some() || track.time.is_some() {
        start(&mut writer, BytesStart::new("metadata"))?;
        if let Some(name) = &track.name {
            write_element(&mut writer, "name", name)?;
        }
        if let Some(time) = track.time {
            write_element(&mut writer, "time", &format_time(time))?;
        }
        end(&mut writer, "metadata")?;
    }

    let mut ranges = track.segment_ranges().into_iter();
    for layout in &track.layout {
        start(&mut writer, BytesStart::new("trk"))?;
        if let Some(name) = &layout.name {
            write_element(&mut writer, "name", name)?;
        }
        for _ in &layout.segment_lens {
            if let Some(range) = ranges.next() {
                write_segment(&mut writer, &track.points[range])?;
            }
        }
        end(&mut writer, "trk")?;
    }
    // Points beyond the declared layout
    let rest: Vec<_> = ranges.collect();
    if !rest.is_empty() {
        start(&mut writer, BytesStart::new("trk"))?;
        for range in rest {
            write_segment(&mut writer, &track.points[range])?;
        }
        end(&mut writer, "trk")?;
    }

    end(&mut writer, "gpx")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|e| TrackError::XmlError(e.to_string()))
}

/// Serialize a track and write it to `path`.
pub fn write_gpx_to_file(track: &Track, path: &Path) -> Result<(), TrackError> {
    let content = write_gpx(track)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn write_segment<W: std::io::Write>(
    writer: &mut Writer<W>,
    points: &[TrackPoint],
) -> Result<(), TrackError> {
    start(writer, BytesStart::new("trkseg"))?;
    for point in points {
        write_trackpoint(writer, point)?;
    }
    end(writer, "trkseg")
}

fn write_trackpoint<W: std::io::Write>(
    writer: &mut Writer<W>,
    point: &TrackPoint,
) -> Result<(), TrackError> {
    let lat = point.latitude.to_string();
    let lon = point.longitude.to_string();
    let mut trkpt = BytesStart::new("trkpt");
    trkpt.push_attribute(("lat", lat.as_str()));
    trkpt.push_attribute(("lon", lon.as_str()));
    start(writer, trkpt)?;

    if let Some(ele) = point.elevation {
        write_element(writer, "ele", &ele.to_string())?;
    }
    if let Some(time) = point.time {
        write_element(writer, "time", &format_time(time))?;
    }

    start(writer, BytesStart::new("extensions"))?;
    start(writer, BytesStart::new("gpxtpx:TrackPointExtension"))?;
    for (key, value) in point.annotations.encode() {
        write_element(writer, &format!("gpxtpx:{}", key), &value)?;
    }
    end(writer, "gpxtpx:TrackPointExtension")?;
    end(writer, "extensions")?;

    end(writer, "trkpt")
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn start<W: std::io::Write>(writer: &mut Writer<W>, elem: BytesStart) -> Result<(), TrackError> {
    writer
        .write_event(Event::Start(elem))
        .map_err(|e| TrackError::XmlError(e.to_string()))
}

fn end<W: std::io::Write>(writer: &mut Writer<W>, name: &str) -> Result<(), TrackError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| TrackError::XmlError(e.to_string()))
}

/// Write a simple element with text content.
fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), TrackError> {
    start(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| TrackError::XmlError(e.to_string()))?;
    end(writer, name)
}
