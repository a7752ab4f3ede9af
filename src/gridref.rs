//! Alphanumeric grid reference codec
//!
//! Parses and formats the human-readable National Grid references used on
//! Ordnance Survey maps: two letters selecting a 100 km tile followed by an
//! even number of digits (up to ten) giving easting/northing offsets inside
//! the tile.
//!
//! The two-tier lettering scheme has an irregular origin, so both tiers are
//! hard-coded lookup tables rather than arithmetic on character codes.

use crate::coord::GridCoordinate;
use crate::{Error, Result};

/// First letter: which 500 km square, as (easting, northing) in 500 km units
/// from the false origin. Only these six letters cover the published grid.
const FIRST_TIER: [(char, i64, i64); 6] = [
    ('S', 0, 0),
    ('T', 1, 0),
    ('N', 0, 1),
    ('O', 1, 1),
    ('H', 0, 2),
    ('J', 1, 2),
];

/// Second letter: position on the 5×5 subgrid of 100 km tiles, row-major
/// from the north-west corner. `I` is never used.
const SECOND_TIER: [char; 25] = [
    'A', 'B', 'C', 'D', 'E', //
    'F', 'G', 'H', 'J', 'K', //
    'L', 'M', 'N', 'O', 'P', //
    'Q', 'R', 'S', 'T', 'U', //
    'V', 'W', 'X', 'Y', 'Z',
];

fn invalid(text: &str, reason: &str) -> Error {
    Error::InvalidGridReference {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

/// Resolve a two-letter tile prefix to the south-west corner of its 100 km
/// tile, in metres.
fn tile_origin(first: char, second: char) -> Option<(i64, i64)> {
    let (_, e500, n500) = *FIRST_TIER.iter().find(|(c, _, _)| *c == first)?;
    let idx = SECOND_TIER.iter().position(|&c| c == second)?;
    let e100 = (idx as i64) % 5;
    let n100 = 4 - (idx as i64) / 5;
    Some((e500 * 500_000 + e100 * 100_000, n500 * 500_000 + n100 * 100_000))
}

/// Letters for the 100 km tile containing the given position. Positions
/// outside the published extent wrap onto it and mean nothing.
fn tile_letters(easting: i64, northing: i64) -> (char, char) {
    let e500 = easting.div_euclid(500_000).rem_euclid(2);
    let n500 = northing.div_euclid(500_000).rem_euclid(3);
    let first = FIRST_TIER
        .iter()
        .find(|(_, e, n)| *e == e500 && *n == n500)
        .map(|(c, _, _)| *c)
        .unwrap_or('S');

    let e100 = easting.div_euclid(100_000).rem_euclid(5);
    let n100 = northing.div_euclid(100_000).rem_euclid(5);
    let second = SECOND_TIER[((4 - n100) * 5 + e100) as usize];
    (first, second)
}

/// Parse a grid reference into metre coordinates.
///
/// Whitespace (leading, trailing, internal) is ignored and letters are
/// case-insensitive: `"NY341151"`, `"NY 341 151"` and `" ny341151 "` parse
/// identically. A bare two-letter reference denotes the tile's south-west
/// corner.
///
/// # Errors
///
/// [`Error::InvalidGridReference`] when the text is not two letters followed
/// by an even number (≤ 10) of digits, or the letters are not a valid tile.
pub fn parse(text: &str) -> Result<GridCoordinate> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut chars = cleaned.chars();
    let (first, second) = match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_ascii_uppercase() && b.is_ascii_uppercase() => (a, b),
        _ => return Err(invalid(text, "expected two letters followed by digits")),
    };

    let digits: &str = &cleaned[2..];
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(text, "expected two letters followed by digits"));
    }
    if digits.len() % 2 != 0 {
        return Err(invalid(text, "odd number of digits"));
    }
    if digits.len() > 10 {
        return Err(invalid(text, "more than ten digits"));
    }

    let (tile_e, tile_n) =
        tile_origin(first, second).ok_or_else(|| invalid(text, "unknown tile letters"))?;

    let k = digits.len() / 2;
    if k == 0 {
        return Ok(GridCoordinate::new(tile_e, tile_n));
    }

    // k digits per axis at 10^(5-k) metres of precision
    let scale = 10_i64.pow((5 - k) as u32);
    let e_off: i64 = digits[..k]
        .parse()
        .map_err(|_| invalid(text, "unparseable easting digits"))?;
    let n_off: i64 = digits[k..]
        .parse()
        .map_err(|_| invalid(text, "unparseable northing digits"))?;

    Ok(GridCoordinate::new(
        tile_e + e_off * scale,
        tile_n + n_off * scale,
    ))
}

/// Format a grid coordinate as a compact reference with `digits_per_axis`
/// digits on each axis, e.g. 3 → `NY341151`, 5 → `NY3410015100`.
pub fn format(grid: &GridCoordinate, digits_per_axis: usize) -> String {
    let (first, second, e_off, n_off) = split(grid, digits_per_axis);
    format!(
        "{}{}{:0width$}{:0width$}",
        first,
        second,
        e_off,
        n_off,
        width = digits_per_axis
    )
}

/// Format a grid coordinate with spaces between the tile letters and each
/// axis, the long display form: `NY 34100 15100`.
pub fn format_spaced(grid: &GridCoordinate, digits_per_axis: usize) -> String {
    let (first, second, e_off, n_off) = split(grid, digits_per_axis);
    format!(
        "{}{} {:0width$} {:0width$}",
        first,
        second,
        e_off,
        n_off,
        width = digits_per_axis
    )
}

fn split(grid: &GridCoordinate, digits_per_axis: usize) -> (char, char, i64, i64) {
    let digits_per_axis = digits_per_axis.min(5);
    let (first, second) = tile_letters(grid.easting, grid.northing);
    let scale = 10_i64.pow((5 - digits_per_axis) as u32);
    let e_off = grid.easting.rem_euclid(100_000) / scale;
    let n_off = grid.northing.rem_euclid(100_000) / scale;
    (first, second, e_off, n_off)
}
