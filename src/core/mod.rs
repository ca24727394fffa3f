//! Core library modules for delivery-dash
//!
//! Data model, error type and the input loader shared by every view.

pub mod error;
pub mod loader;
pub mod model;

pub use loader::{load, Dataset, Inputs, Upload, UploadSlot, Uploads};
pub use model::{GeocodeTable, Matrix, MatrixSummary, RouteStop, RoutesTable, Store, VehicleId};
