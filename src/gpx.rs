use crate::error::Error;
use crate::types::{TrackPoint, TrackSummary};
use crate::utils::haversine_miles;
use anyhow::Result;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use std::fs;
use std::io::{BufReader, Cursor};
use std::path::Path;

#[derive(Debug, Default)]
pub struct ParsedGpx {
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
}

pub fn parse_gpx_file(path: &Path) -> Result<ParsedGpx> {
    let bytes = fs::read(path)?;
    parse_gpx_bytes(bytes)
}

pub fn parse_gpx_bytes(bytes: Vec<u8>) -> Result<ParsedGpx> {
    if bytes.is_empty() {
        return Ok(ParsedGpx::default());
    }

    let cursor = Cursor::new(bytes);
    let reader = BufReader::new(cursor);
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();

    let mut st = GpxState::default();
    let mut out = ParsedGpx::default();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => handle_gpx_start(&mut st, &e),
            Ok(Event::End(e)) => handle_gpx_end(&mut st, &e, &mut out.points),
            Ok(Event::Text(e)) => handle_gpx_text(&mut st, &e, &mut out.name),
            Err(e) => anyhow::bail!("GPX XML parse error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Duration, distance and average heart rate of a parsed track.
///
/// Points are taken in document order; distance is the haversine sum of
/// consecutive segments.
pub fn summarize_track(parsed: &ParsedGpx) -> Result<TrackSummary, Error> {
    let pts = &parsed.points;
    let (Some(first), Some(last)) = (pts.first(), pts.last()) else {
        return Err(Error::Gpx("track has no timed points".to_string()));
    };

    let distance_miles: f64 = pts
        .windows(2)
        .map(|w| haversine_miles(w[0].lat, w[0].lon, w[1].lat, w[1].lon))
        .sum();

    let duration_ms = (last.t - first.t).num_milliseconds();
    let duration_minutes = duration_ms as f64 / 60_000.0;

    let hrs: Vec<i64> = pts.iter().filter_map(|p| p.hr).map(i64::from).collect();
    let avg_heart_rate = if hrs.is_empty() {
        None
    } else {
        let avg = hrs.iter().sum::<i64>() as f64 / hrs.len() as f64;
        i32::try_from(avg.round() as i64).ok()
    };

    Ok(TrackSummary {
        name: parsed.name.clone(),
        start: first.t,
        duration_minutes,
        distance_miles,
        avg_heart_rate,
        points: pts.len(),
    })
}

#[derive(Default)]
struct GpxState {
    in_trkpt: bool,
    in_time: bool,
    in_hr: bool,
    in_name: bool,

    cur_lat: Option<f64>,
    cur_lon: Option<f64>,
    cur_time: Option<DateTime<Utc>>,
    cur_hr: Option<i32>,
}

fn handle_gpx_start(st: &mut GpxState, e: &BytesStart<'_>) {
    match e.local_name().as_ref() {
        b"trkpt" => {
            st.in_trkpt = true;
            st.in_time = false;
            st.in_hr = false;

            st.cur_time = None;
            st.cur_hr = None;

            let (lat, lon) = parse_trkpt_lat_lon(e);
            st.cur_lat = lat;
            st.cur_lon = lon;
        }
        b"time" if st.in_trkpt => st.in_time = true,
        b"hr" if st.in_trkpt => st.in_hr = true,
        b"name" if !st.in_trkpt => st.in_name = true,
        _ => {}
    }
}

fn handle_gpx_end(st: &mut GpxState, e: &BytesEnd<'_>, out: &mut Vec<TrackPoint>) {
    match e.local_name().as_ref() {
        b"time" => st.in_time = false,
        b"hr" => st.in_hr = false,
        b"name" => st.in_name = false,
        b"trkpt" => {
            st.in_trkpt = false;

            let (Some(lat), Some(lon), Some(t)) = (st.cur_lat, st.cur_lon, st.cur_time) else {
                return;
            };

            out.push(TrackPoint {
                t,
                lat,
                lon,
                hr: st.cur_hr,
            });
        }
        _ => {}
    }
}

fn handle_gpx_text(st: &mut GpxState, e: &BytesText<'_>, name: &mut Option<String>) {
    let Ok(s) = e.decode() else {
        return;
    };

    if st.in_time {
        if let Ok(dt_fixed) = DateTime::parse_from_rfc3339(s.as_ref()) {
            st.cur_time = Some(dt_fixed.with_timezone(&Utc));
        }
    } else if st.in_hr {
        st.cur_hr = s.trim().parse::<i32>().ok();
    } else if st.in_name && name.is_none() && !s.trim().is_empty() {
        *name = Some(s.trim().to_string());
    }
}

fn parse_trkpt_lat_lon(e: &BytesStart<'_>) -> (Option<f64>, Option<f64>) {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for a in e.attributes().with_checks(false).flatten() {
        let key = a.key.as_ref();
        if key == b"lat"
            && let Ok(v) = a.unescape_value()
        {
            lat = v.parse::<f64>().ok();
        } else if key == b"lon"
            && let Ok(v) = a.unescape_value()
        {
            lon = v.parse::<f64>().ok();
        }
    }

    (lat, lon)
}
