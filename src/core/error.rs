//! Error types for delivery-dash
//!
//! Every failure that can surface from parsing an upload or rendering a view,
//! plus the column-name fuzzy matching used to make those errors actionable.

use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

use crate::formats::npy::NpyError;

/// Main error type for delivery-dash operations
#[derive(Debug, Error)]
pub enum Error {
    /// The CSV reader rejected the file (bad UTF-8, ragged rows, ...)
    #[error("{file}: {source}")]
    Csv {
        file: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A required header is absent
    #[error("{file}: missing required column '{column}'{}", did_you_mean(.suggestion))]
    MissingColumn {
        file: &'static str,
        column: &'static str,
        suggestion: Option<String>,
    },

    /// A cell could not be converted to the column's type
    #[error("{file}, row {row}: column '{column}' has invalid value '{value}' (expected {expected})")]
    InvalidValue {
        file: &'static str,
        /// 1-based data row (header excluded)
        row: usize,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A matrix upload is not a readable .npy array
    #[error("{file}: {source}")]
    Matrix {
        file: &'static str,
        #[source]
        source: NpyError,
    },

    /// The static chart backend failed
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

/// Convenience result type for delivery-dash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Suggest the header the user most likely meant for a missing column
///
/// Blends Jaro-Winkler (70%) with normalized Levenshtein (30%) on the
/// lowercased names, ignoring spaces, underscores and dashes so that
/// `store_name` or `Store Name` resolve to `StoreName`. Exact matches return
/// `None`: there is nothing to correct.
pub fn suggest_column<'a, I>(wanted: &str, headers: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted_key = normalize(wanted);
    let min_threshold = 0.75;

    let mut best_match = None;
    let mut best_score = 0.0f64;

    for header in headers {
        if header == wanted {
            return None;
        }
        let key = normalize(header);
        if key.is_empty() {
            continue;
        }

        let score = if key == wanted_key {
            1.0
        } else {
            jaro_winkler(&wanted_key, &key) * 0.7 + normalized_levenshtein(&wanted_key, &key) * 0.3
        };

        if score >= min_threshold && score > best_score {
            best_score = score;
            best_match = Some(header.to_string());
        }
    }

    best_match
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_column_case_and_separators() {
        let headers = ["store_name", "lat", "Longitude"];
        assert_eq!(suggest_column("StoreName", headers), Some("store_name".to_string()));

        let headers = ["Store Name", "Latitude", "Longitude"];
        assert_eq!(suggest_column("StoreName", headers), Some("Store Name".to_string()));

        let headers = ["VehicleId", "StoreName", "GoogleMapsLink"];
        assert_eq!(suggest_column("VehicleID", headers), Some("VehicleId".to_string()));
    }

    #[test]
    fn test_suggest_column_typos() {
        let headers = ["StoreName", "Lattitude", "Longitude"];
        assert_eq!(suggest_column("Latitude", headers), Some("Lattitude".to_string()));

        let headers = ["VehicleID", "StoreName", "GoogleMapLink"];
        assert_eq!(
            suggest_column("GoogleMapsLink", headers),
            Some("GoogleMapLink".to_string())
        );
    }

    #[test]
    fn test_suggest_column_no_match() {
        let headers = ["foo", "bar", "baz"];
        assert_eq!(suggest_column("Latitude", headers), None);
        assert_eq!(suggest_column("Latitude", std::iter::empty()), None);
    }

    #[test]
    fn test_missing_column_message() {
        let err = Error::MissingColumn {
            file: "geocode CSV",
            column: "Latitude",
            suggestion: Some("latitude".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "geocode CSV: missing required column 'Latitude' (did you mean 'latitude'?)"
        );

        let err = Error::MissingColumn {
            file: "routes CSV",
            column: "VehicleID",
            suggestion: None,
        };
        assert_eq!(err.to_string(), "routes CSV: missing required column 'VehicleID'");
    }
}
