//! GPX parser producing a [`Track`] with decoded point annotations.
//!
//! Geometry, time and names come from the `gpx` crate, which drops
//! `<extensions>`. A second streaming pass with `quick-xml` collects the
//! extension key/value pairs of every point in document order; they are
//! matched to the parsed points by index.

use super::{Annotations, Track, TrackError, TrackLayout, TrackPoint};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

/// Convert gpx Time to chrono DateTime
fn gpx_time_to_chrono(time: gpx::Time) -> Option<DateTime<Utc>> {
    // gpx::Time wraps time::OffsetDateTime, convert via string format
    let formatted = time.format().ok()?;
    DateTime::parse_from_rfc3339(&formatted)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_track_point(point: &gpx::Waypoint) -> TrackPoint {
    TrackPoint {
        time: point.time.and_then(gpx_time_to_chrono),
        latitude: point.point().y(),
        longitude: point.point().x(),
        elevation: point.elevation.filter(|e| e.is_finite()),
        annotations: Annotations::default(),
    }
}

/// Parse GPX file content into a track.
///
/// Track points are used when present, otherwise route points (one layout
/// entry per route). A file without any point is an error.
pub fn parse_gpx(content: &[u8]) -> Result<Track, TrackError> {
    let content_str = std::str::from_utf8(content)
        .map_err(|e| TrackError::ParseError(format!("Invalid UTF-8: {}", e)))?;

    let gpx_data: gpx::Gpx = gpx::read(content_str.as_bytes())
        .map_err(|e| TrackError::ParseError(format!("GPX parse error: {}", e)))?;

    let mut points = Vec::new();
    let mut layout = Vec::new();

    for track in &gpx_data.tracks {
        let mut segment_lens = Vec::with_capacity(track.segments.len());
        for segment in &track.segments {
            points.extend(segment.points.iter().map(to_track_point));
            segment_lens.push(segment.points.len());
        }
        layout.push(TrackLayout {
            name: track.name.clone(),
            segment_lens,
        });
    }

    let mut point_element = "trkpt";
    if points.is_empty() {
        layout.clear();
        for route in &gpx_data.routes {
            points.extend(route.points.iter().map(to_track_point));
            layout.push(TrackLayout {
                name: route.name.clone(),
                segment_lens: vec![route.points.len()],
            });
        }
        point_element = "rtept";
    }

    if points.is_empty() {
        return Err(TrackError::Empty);
    }

    let extensions = read_point_extensions(content, point_element)?;
    if extensions.len() == points.len() {
        for (point, pairs) in points.iter_mut().zip(&extensions) {
            point.annotations =
                Annotations::decode(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    } else {
        warn!(
            "Extension blocks ({}) do not match point count ({}), ignoring extensions",
            extensions.len(),
            points.len()
        );
    }

    let metadata_name = gpx_data.metadata.as_ref().and_then(|m| m.name.clone());
    let time = gpx_data
        .metadata
        .as_ref()
        .and_then(|m| m.time)
        .and_then(gpx_time_to_chrono);
    let name = metadata_name.or_else(|| layout.iter().find_map(|t| t.name.clone()));

    debug!("Parsed GPX with {} points in {} tracks", points.len(), layout.len());

    Ok(Track {
        name,
        time,
        points,
        layout,
    })
}

/// Collect the leaf `key → text` pairs found inside the `<extensions>` of
/// every `point_element`, one entry per point in document order.
///
/// Keys are local names, so `gpxtpx:hr` and `ns3:hr` both yield `hr`.
pub fn read_point_extensions(
    content: &[u8],
    point_element: &str,
) -> Result<Vec<Vec<(String, String)>>, TrackError> {
    let mut reader = Reader::from_reader(content);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut result: Vec<Vec<(String, String)>> = Vec::new();
    let mut in_point = false;
    let mut extensions_depth = 0usize;
    let mut current_key: Option<String> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| TrackError::XmlError(e.to_string()))?
        {
            Event::Start(e) => {
                let local = e.local_name();
                let name = String::from_utf8_lossy(local.as_ref()).into_owned();
                if name == point_element {
                    in_point = true;
                    result.push(Vec::new());
                } else if in_point && name == "extensions" {
                    extensions_depth += 1;
                } else if extensions_depth > 0 {
                    extensions_depth += 1;
                    current_key = Some(name);
                }
            }
            Event::Empty(e) => {
                // Self-closing point without children
                if !in_point && e.local_name().as_ref() == point_element.as_bytes() {
                    result.push(Vec::new());
                }
            }
            Event::Text(e) => {
                if let (Some(key), Some(pairs)) = (current_key.as_ref(), result.last_mut()) {
                    let text = e
                        .unescape()
                        .map_err(|e| TrackError::XmlError(e.to_string()))?;
                    pairs.push((key.clone(), text.into_owned()));
                }
            }
            Event::CData(e) => {
                if let (Some(key), Some(pairs)) = (current_key.as_ref(), result.last_mut()) {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    pairs.push((key.clone(), text));
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                if local.as_ref() == point_element.as_bytes() {
                    in_point = false;
                    extensions_depth = 0;
                } else if extensions_depth > 0 {
                    extensions_depth -= 1;
                }
                current_key = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(result)
}
