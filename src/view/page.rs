//! Page controller - the pure `render(uploads, selections)` step
//!
//! Every interaction (an upload, a dropdown change) re-runs this from the
//! session's current uploads. Nothing is cached between calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;
use utoipa::ToSchema;

use crate::core::error::Result;
use crate::core::loader::{load, Dataset, Inputs, UploadSlot, Uploads};
use crate::core::model::{MatrixSummary, VehicleId};

use super::join::join_routes;
use super::map::MapView;
use super::plot::PlotView;
use super::table::RouteTableView;

pub const SUCCESS_MESSAGE: &str = "Files successfully loaded!";
pub const INCOMPLETE_MESSAGE: &str = "Please upload all required files from the sidebar to continue.";

/// Delivery day shown in the sidebar; display-only, it filters nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DeliveryDay {
    #[default]
    Monday,
    Wednesday,
    Friday,
}

impl DeliveryDay {
    pub const ALL: [DeliveryDay; 3] = [DeliveryDay::Monday, DeliveryDay::Wednesday, DeliveryDay::Friday];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryDay::Monday => "Monday",
            DeliveryDay::Wednesday => "Wednesday",
            DeliveryDay::Friday => "Friday",
        }
    }
}

impl fmt::Display for DeliveryDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryDay {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DeliveryDay::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid delivery day: {s}. Use Monday, Wednesday or Friday."))
    }
}

/// UI state carried by the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selections {
    pub vehicle: Option<VehicleId>,
    pub day: DeliveryDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MatrixSummaries {
    pub distance: MatrixSummary,
    pub duration: MatrixSummary,
}

/// The three data views, in display order
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Dashboard {
    pub table: RouteTableView,
    pub map: MapView,
    pub plot: PlotView,
    pub matrices: MatrixSummaries,
}

impl Dashboard {
    pub fn build(dataset: &Dataset, vehicle: Option<VehicleId>) -> Self {
        let joined = join_routes(&dataset.stores, &dataset.routes);
        Self {
            table: RouteTableView::build(&dataset.routes, vehicle),
            map: MapView::build(&dataset.stores, &joined),
            plot: PlotView::build(&joined),
            matrices: MatrixSummaries {
                distance: dataset.distance.summary(),
                duration: dataset.duration.summary(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageState {
    /// Fewer than four uploads: prompts and a warning, no data views
    Incomplete { missing: Vec<UploadSlot> },
    /// All four uploads parsed
    Ready(Box<Dashboard>),
}

/// Everything the page shows for one interaction
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ViewModel {
    pub day: DeliveryDay,
    /// Uploaded file name per slot, in slot order (`None` = not uploaded)
    pub files: Vec<UploadedFile>,
    pub state: PageState,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UploadedFile {
    pub slot: UploadSlot,
    pub file_name: Option<String>,
}

impl ViewModel {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match &self.state {
            PageState::Ready(dashboard) => Some(dashboard),
            PageState::Incomplete { .. } => None,
        }
    }
}

/// Build the page for the given uploads and UI selections
///
/// Missing uploads are not an error; malformed ones are, and abort the whole
/// page so the user can re-upload.
pub fn render(uploads: &Uploads, selections: &Selections) -> Result<ViewModel> {
    let started = Instant::now();

    let state = match load(uploads)? {
        Inputs::Incomplete { missing } => PageState::Incomplete { missing },
        Inputs::Ready(dataset) => PageState::Ready(Box::new(Dashboard::build(&dataset, selections.vehicle))),
    };

    debug!(
        ready = matches!(state, PageState::Ready(_)),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Rendered view model"
    );

    Ok(ViewModel {
        day: selections.day,
        files: sidebar_files(uploads),
        state,
    })
}

/// Slot-by-slot upload status for the sidebar; works for any upload subset
pub fn sidebar_files(uploads: &Uploads) -> Vec<UploadedFile> {
    UploadSlot::ALL
        .into_iter()
        .map(|slot| UploadedFile {
            slot,
            file_name: uploads.get(slot).map(|u| u.file_name.clone()),
        })
        .collect()
}
