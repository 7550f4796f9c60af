use crate::error::Error;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,stridelog={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Accepts RFC 3339 (`2024-05-01T07:30:00+02:00`), a naive ISO 8601
/// date-time (`2024-05-01T07:30:00`, read as UTC) or a bare date.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, Error> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::InvalidDate(s.to_string()))
}

/// `hh:mm:ss` for a duration given in (fractional) minutes.
pub fn format_minutes(minutes: f64) -> String {
    let secs = (minutes * 60.0).round().abs() as u64;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Great-circle distance between two WGS84 points.
pub fn haversine_miles(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let dlat = (lat1 - lat0).to_radians();
    let dlon = (lon1 - lon0).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat0.to_radians().cos() * lat1.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).unwrap();
        assert_eq!(parse_date("2024-05-01T07:30:00Z").unwrap(), expected);
        assert_eq!(parse_date("2024-05-01T09:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_date("2024-05-01T07:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024-05-01T07:30").unwrap(), expected);
        assert_eq!(
            parse_date("2024-05-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(parse_date("yesterday"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0.0), "00:00:00");
        assert_eq!(format_minutes(42.5), "00:42:30");
        assert_eq!(format_minutes(125.0), "02:05:00");
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        // one degree of latitude is ~69.1 miles
        let d = haversine_miles(51.0, 0.0, 52.0, 0.0);
        assert!((d - 69.09).abs() < 0.05);
        assert_eq!(haversine_miles(51.0, 0.0, 51.0, 0.0), 0.0);
    }
}
