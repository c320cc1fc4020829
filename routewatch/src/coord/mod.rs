//! Geographic coordinates and coordinate-string parsing.
//!
//! Route endpoints can be typed by hand as `"lat, lon"`. [`parse_coordinates`]
//! recognises that shape without any network round trip; anything that does
//! not look like a pair is left for the geocoder.

mod types;

pub use types::{CoordError, CoordinatePair, Extent, LonLat, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use regex::Regex;
use std::sync::OnceLock;

/// Pattern for a `"number, number"` pair with optional sign and decimals.
fn pair_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([+-]?\d{1,3}(?:\.\d+)?)\s*[,;]\s*([+-]?\d{1,3}(?:\.\d+)?)\s*$")
            .expect("coordinate pair pattern is valid")
    })
}

/// Parses a hand-typed coordinate pair.
///
/// The conventional order is `lat, lon`. When the first component has a
/// magnitude above 90 it cannot be a latitude, so the pair is read as
/// `lon, lat` instead.
///
/// # Returns
///
/// - `Ok(None)` when the input is not shaped like a coordinate pair (an address)
/// - `Ok(Some(point))` for a valid pair
/// - `Err(_)` when the input is pair-shaped but out of range
pub fn parse_coordinates(input: &str) -> Result<Option<LonLat>, CoordError> {
    let Some(captures) = pair_pattern().captures(input) else {
        return Ok(None);
    };

    let first: f64 = captures[1]
        .parse()
        .map_err(|_| CoordError::Unparsable(input.to_string()))?;
    let second: f64 = captures[2]
        .parse()
        .map_err(|_| CoordError::Unparsable(input.to_string()))?;

    let (lat, lon) = if first.abs() > MAX_LAT && second.abs() <= MAX_LAT {
        (second, first)
    } else {
        (first, second)
    };

    LonLat::new(lon, lat).map(Some)
}
