//! Interchange format tags, mime types, HTTP `Accept` negotiation and
//! the parse/dump dispatch used by collaborators.

use crate::err::Error;
use crate::grid::Grid;
use log::debug;

pub const MIME_ZINC: &str = "text/zinc";
pub const MIME_JSON: &str = "application/json";
pub const MIME_CSV: &str = "text/csv";

/// The interchange formats this crate can read and write.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    Zinc,
    Json,
    Csv,
}

/// Preference order used when an `Accept` header weights several
/// formats equally.
const PREFERENCE: [Format; 3] = [Format::Csv, Format::Zinc, Format::Json];

impl Format {
    pub const fn mime(&self) -> &'static str {
        match self {
            Format::Zinc => MIME_ZINC,
            Format::Json => MIME_JSON,
            Format::Csv => MIME_CSV,
        }
    }

    pub const fn suffix(&self) -> &'static str {
        match self {
            Format::Zinc => ".zinc",
            Format::Json => ".json",
            Format::Csv => ".csv",
        }
    }

    /// Map a mime type (parameters ignored) to a format.
    pub fn from_mime(mime: &str) -> Result<Self, Error> {
        let bare = mime.split(';').next().unwrap_or("").trim();
        match bare {
            MIME_ZINC => Ok(Format::Zinc),
            MIME_JSON => Ok(Format::Json),
            MIME_CSV => Ok(Format::Csv),
            _ => Err(Error::UnsupportedFormat(mime.to_owned())),
        }
    }
}

/// Parse a grid from text in the given format.
pub fn parse(s: &str, format: Format) -> Result<Grid, Error> {
    let grid = match format {
        Format::Zinc => crate::zinc::parse(s)?,
        Format::Json => crate::json::parse(s)?,
        Format::Csv => crate::csv::parse(s)?,
    };
    Ok(grid)
}

/// Dump a grid as text in the given format.
pub fn dump(grid: &Grid, format: Format) -> Result<String, Error> {
    match format {
        Format::Zinc => Ok(crate::zinc::dump(grid)),
        Format::Json => Ok(grid.to_json_string()),
        Format::Csv => crate::csv::dump(grid),
    }
}

/// Pick a format for an HTTP `Accept` header.
///
/// Entries are weighted by their `q` parameter (default 1, malformed
/// entries skipped). Among equally weighted entries the preference is
/// csv over zinc over json. Returns `Error::NotAcceptable` when no
/// available format matches.
pub fn negotiate(accept: &str, available: &[Format]) -> Result<Format, Error> {
    let entries: Vec<(String, f64)> = accept
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            let mut parts = raw.split(';');
            let mime = parts.next()?.trim();
            if mime.is_empty() {
                return None;
            }
            let mut weight = 1.0f64;
            for param in parts {
                if let Some(q) = param.trim().strip_prefix("q=") {
                    if let Ok(parsed) = q.trim().parse::<f64>() {
                        weight = parsed;
                    }
                }
            }
            if weight <= 0.0 {
                return None;
            }
            Some((mime.to_owned(), weight))
        })
        .collect();

    let mut weights: Vec<f64> = entries.iter().map(|(_, weight)| *weight).collect();
    weights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    weights.dedup();

    for weight in weights {
        for format in PREFERENCE.iter() {
            if !available.contains(format) {
                continue;
            }
            let matched = entries.iter().any(|(mime, entry_weight)| {
                *entry_weight == weight && mime_matches(mime, format.mime())
            });
            if matched {
                debug!("negotiated {:?} for Accept '{}'", format, accept);
                return Ok(*format);
            }
        }
    }
    Err(Error::NotAcceptable(accept.to_owned()))
}

fn mime_matches(pattern: &str, mime: &str) -> bool {
    if pattern == "*/*" || pattern == mime {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(main_type) => mime.split('/').next() == Some(main_type),
        None => false,
    }
}
