//! # Delivery-dash Library
//!
//! Interactive dashboard for pre-computed delivery routes. Four files go in:
//! a geocoded store list, an optimized routes table and two `.npy` matrices
//! (distance and duration). Out come a per-vehicle route table, a Leaflet map
//! of every route and a static longitude/latitude chart.
//!
//! ## Features
//!
//! - **Pure rendering**: [`render`] maps uploads and UI selections to a
//!   [`ViewModel`], with no state kept between calls
//! - **Lenient join**: stops whose store is not geocoded are skipped on the
//!   map and chart, never an error
//! - **Actionable errors**: a missing CSV column suggests the closest header
//! - **Server or file**: `delivery-dash serve` for the browser dashboard,
//!   `delivery-dash render` for a standalone HTML page
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use delivery_dash::{render, Selections, Upload, UploadSlot, Uploads};
//! use std::path::Path;
//!
//! fn main() -> delivery_dash::Result<()> {
//!     let mut uploads = Uploads::default();
//!     uploads.set(UploadSlot::Geocode, Upload::from_path(Path::new("stores.csv"))?);
//!     uploads.set(UploadSlot::Routes, Upload::from_path(Path::new("routes.csv"))?);
//!     uploads.set(UploadSlot::DistanceMatrix, Upload::from_path(Path::new("distance.npy"))?);
//!     uploads.set(UploadSlot::DurationMatrix, Upload::from_path(Path::new("duration.npy"))?);
//!
//!     let view = render(&uploads, &Selections::default())?;
//!     if let Some(dashboard) = view.dashboard() {
//!         println!("{} vehicles", dashboard.table.vehicles.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod formats;
pub mod server;
pub mod view;

pub use crate::core::error::{Error, Result};
pub use crate::core::loader::{load, Dataset, Inputs, Upload, UploadSlot, Uploads};
pub use crate::core::model::VehicleId;
pub use crate::view::page::{render, DeliveryDay, PageState, Selections, ViewModel};
