//! In-memory tables built from the uploaded files
//!
//! Everything here is rebuilt from the raw upload buffers on every render and
//! never mutated afterwards.

use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Vehicle identifier from the `VehicleID` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct VehicleId(pub i64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, geocoded delivery location (one row of the geocode CSV)
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Parsed geocode CSV, rows in file order
#[derive(Debug, Clone, Default)]
pub struct GeocodeTable {
    pub stores: Vec<Store>,
}

impl GeocodeTable {
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

/// One (vehicle, store) assignment; its position in the file is its visit order
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub vehicle_id: VehicleId,
    pub store_name: String,
    pub google_maps_link: String,
    /// Every cell of the source record, aligned with [`RoutesTable::columns`]
    pub record: Vec<String>,
}

/// Parsed routes CSV
#[derive(Debug, Clone, Default)]
pub struct RoutesTable {
    /// Header names exactly as uploaded
    pub columns: Vec<String>,
    pub stops: Vec<RouteStop>,
}

impl RoutesTable {
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// Dense 2-D numeric array, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from row-major data; `None` if `data` does not hold `rows * cols` values
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols)? == data.len()).then_some(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Value at (`row`, `col`); `None` outside the shape
    ///
    /// The dashboard only shows matrix shapes; element access is for library
    /// callers working with a loaded [`Dataset`](crate::core::loader::Dataset).
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// One row as a slice, e.g. every distance from one store; `None` past the last row
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row < self.rows {
            Some(&self.data[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    pub fn summary(&self) -> MatrixSummary {
        MatrixSummary {
            rows: self.rows,
            cols: self.cols,
            square: self.is_square(),
        }
    }
}

/// Shape of an uploaded matrix as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MatrixSummary {
    pub rows: usize,
    pub cols: usize,
    pub square: bool,
}
