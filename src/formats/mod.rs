//! Readers for the uploaded file formats

pub mod npy;
pub mod tables;

pub use npy::{read_npy, NpyError};
pub use tables::{parse_geocode, parse_routes};
