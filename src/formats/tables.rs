//! Geocode and routes CSV readers
//!
//! Columns are located by header name, so column order and extra columns in
//! the uploaded files do not matter. Header cells are trimmed; data cells are
//! kept verbatim because store names are joined by exact equality.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::core::error::{suggest_column, Error, Result};
use crate::core::model::{GeocodeTable, RouteStop, RoutesTable, Store, VehicleId};

pub const GEOCODE_FILE: &str = "geocode CSV";
pub const ROUTES_FILE: &str = "routes CSV";

pub const COL_STORE_NAME: &str = "StoreName";
pub const COL_LATITUDE: &str = "Latitude";
pub const COL_LONGITUDE: &str = "Longitude";
pub const COL_VEHICLE_ID: &str = "VehicleID";
pub const COL_MAPS_LINK: &str = "GoogleMapsLink";

/// Parse the geocode upload (`StoreName`, `Latitude`, `Longitude`)
pub fn parse_geocode(bytes: &[u8]) -> Result<GeocodeTable> {
    let file = GEOCODE_FILE;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers = reader.headers().map_err(|source| Error::Csv { file, source })?.clone();
    let idx_name = column(&headers, COL_STORE_NAME, file)?;
    let idx_lat = column(&headers, COL_LATITUDE, file)?;
    let idx_lon = column(&headers, COL_LONGITUDE, file)?;

    let mut stores = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|source| Error::Csv { file, source })?;
        let row = i + 1;
        stores.push(Store {
            name: cell(&record, idx_name).to_string(),
            lat: parse_cell(&record, idx_lat, row, COL_LATITUDE, file, "a number")?,
            lon: parse_cell(&record, idx_lon, row, COL_LONGITUDE, file, "a number")?,
        });
    }

    Ok(GeocodeTable { stores })
}

/// Parse the routes upload (`VehicleID`, `StoreName`, `GoogleMapsLink`, plus any extras)
pub fn parse_routes(bytes: &[u8]) -> Result<RoutesTable> {
    let file = ROUTES_FILE;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers = reader.headers().map_err(|source| Error::Csv { file, source })?.clone();
    let idx_vehicle = column(&headers, COL_VEHICLE_ID, file)?;
    let idx_name = column(&headers, COL_STORE_NAME, file)?;
    let idx_link = column(&headers, COL_MAPS_LINK, file)?;

    let mut stops = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|source| Error::Csv { file, source })?;
        let row = i + 1;
        let vehicle: i64 = parse_cell(&record, idx_vehicle, row, COL_VEHICLE_ID, file, "an integer")?;
        stops.push(RouteStop {
            vehicle_id: VehicleId(vehicle),
            store_name: cell(&record, idx_name).to_string(),
            google_maps_link: cell(&record, idx_link).to_string(),
            record: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(RoutesTable {
        columns: headers.iter().map(str::to_string).collect(),
        stops,
    })
}

fn column(headers: &StringRecord, name: &'static str, file: &'static str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::MissingColumn {
            file,
            column: name,
            suggestion: suggest_column(name, headers.iter()),
        })
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn parse_cell<T: std::str::FromStr>(
    record: &StringRecord,
    idx: usize,
    row: usize,
    column: &'static str,
    file: &'static str,
    expected: &'static str,
) -> Result<T> {
    let raw = cell(record, idx);
    raw.trim().parse().map_err(|_| Error::InvalidValue {
        file,
        row,
        column,
        value: raw.to_string(),
        expected,
    })
}
