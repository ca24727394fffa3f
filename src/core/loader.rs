//! Input loader - turns the four upload buffers into a parsed dataset
//!
//! The loader never looks at partial input: until every slot is filled the
//! result is [`Inputs::Incomplete`] and nothing is parsed.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use utoipa::ToSchema;

use crate::core::error::{Error, Result};
use crate::core::model::{GeocodeTable, Matrix, RoutesTable};
use crate::formats::{parse_geocode, parse_routes, read_npy};

/// One of the four required uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadSlot {
    Geocode,
    Routes,
    DistanceMatrix,
    DurationMatrix,
}

impl UploadSlot {
    /// All slots, in the order they are prompted for
    pub const ALL: [UploadSlot; 4] = [
        UploadSlot::Geocode,
        UploadSlot::Routes,
        UploadSlot::DistanceMatrix,
        UploadSlot::DurationMatrix,
    ];

    /// Form field / URL name
    pub fn key(self) -> &'static str {
        match self {
            UploadSlot::Geocode => "geocode",
            UploadSlot::Routes => "routes",
            UploadSlot::DistanceMatrix => "distance_matrix",
            UploadSlot::DurationMatrix => "duration_matrix",
        }
    }

    /// Prompt shown next to the upload control
    pub fn label(self) -> &'static str {
        match self {
            UploadSlot::Geocode => "Upload Geocoded Store Data (CSV)",
            UploadSlot::Routes => "Upload Optimized Routes (CSV)",
            UploadSlot::DistanceMatrix => "Upload Distance Matrix (.npy)",
            UploadSlot::DurationMatrix => "Upload Duration Matrix (.npy)",
        }
    }

    /// File extension accepted by the upload control
    pub fn accept(self) -> &'static str {
        match self {
            UploadSlot::Geocode | UploadSlot::Routes => ".csv",
            UploadSlot::DistanceMatrix | UploadSlot::DurationMatrix => ".npy",
        }
    }

    /// Name used in error messages
    pub fn file_kind(self) -> &'static str {
        match self {
            UploadSlot::Geocode => crate::formats::tables::GEOCODE_FILE,
            UploadSlot::Routes => crate::formats::tables::ROUTES_FILE,
            UploadSlot::DistanceMatrix => "distance matrix",
            UploadSlot::DurationMatrix => "duration matrix",
        }
    }
}

impl fmt::Display for UploadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for UploadSlot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        UploadSlot::ALL
            .into_iter()
            .find(|slot| slot.key() == s)
            .ok_or_else(|| format!("Unknown upload slot: {s}"))
    }
}

/// A single uploaded file, kept as the raw bytes the browser sent
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping its base name as the upload name
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// The four upload slots of one session; each may be empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uploads {
    geocode: Option<Upload>,
    routes: Option<Upload>,
    distance_matrix: Option<Upload>,
    duration_matrix: Option<Upload>,
}

impl Uploads {
    pub fn get(&self, slot: UploadSlot) -> Option<&Upload> {
        self.slot_ref(slot).as_ref()
    }

    /// Replace the slot's content with a new upload
    pub fn set(&mut self, slot: UploadSlot, upload: Upload) {
        *self.slot_mut(slot) = Some(upload);
    }

    pub fn clear(&mut self, slot: UploadSlot) {
        *self.slot_mut(slot) = None;
    }

    /// Slots that still need a file, in prompt order
    pub fn missing(&self) -> Vec<UploadSlot> {
        UploadSlot::ALL
            .into_iter()
            .filter(|slot| self.get(*slot).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    fn slot_ref(&self, slot: UploadSlot) -> &Option<Upload> {
        match slot {
            UploadSlot::Geocode => &self.geocode,
            UploadSlot::Routes => &self.routes,
            UploadSlot::DistanceMatrix => &self.distance_matrix,
            UploadSlot::DurationMatrix => &self.duration_matrix,
        }
    }

    fn slot_mut(&mut self, slot: UploadSlot) -> &mut Option<Upload> {
        match slot {
            UploadSlot::Geocode => &mut self.geocode,
            UploadSlot::Routes => &mut self.routes,
            UploadSlot::DistanceMatrix => &mut self.distance_matrix,
            UploadSlot::DurationMatrix => &mut self.duration_matrix,
        }
    }
}

/// Everything the views need, parsed from a complete set of uploads
#[derive(Debug, Clone)]
pub struct Dataset {
    pub stores: GeocodeTable,
    pub routes: RoutesTable,
    pub distance: Matrix,
    pub duration: Matrix,
}

/// Result of loading: either nothing to show yet, or a parsed dataset
#[derive(Debug, Clone)]
pub enum Inputs {
    Incomplete { missing: Vec<UploadSlot> },
    Ready(Box<Dataset>),
}

/// Parse all four uploads, or report which ones are still missing
pub fn load(uploads: &Uploads) -> Result<Inputs> {
    let (Some(geocode), Some(routes), Some(distance), Some(duration)) = (
        uploads.get(UploadSlot::Geocode),
        uploads.get(UploadSlot::Routes),
        uploads.get(UploadSlot::DistanceMatrix),
        uploads.get(UploadSlot::DurationMatrix),
    ) else {
        return Ok(Inputs::Incomplete {
            missing: uploads.missing(),
        });
    };

    let dataset = Dataset {
        stores: parse_geocode(&geocode.bytes)?,
        routes: parse_routes(&routes.bytes)?,
        distance: load_matrix(UploadSlot::DistanceMatrix, distance)?,
        duration: load_matrix(UploadSlot::DurationMatrix, duration)?,
    };

    debug!(
        stores = dataset.stores.len(),
        route_rows = dataset.routes.len(),
        distance_shape = ?(dataset.distance.rows(), dataset.distance.cols()),
        duration_shape = ?(dataset.duration.rows(), dataset.duration.cols()),
        "Parsed uploads"
    );

    Ok(Inputs::Ready(Box::new(dataset)))
}

fn load_matrix(slot: UploadSlot, upload: &Upload) -> Result<Matrix> {
    read_npy(&upload.bytes).map_err(|source| Error::Matrix {
        file: slot.file_kind(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_load_complete() {
        match load(&uploads(STORES_CSV, ROUTES_CSV)).unwrap() {
            Inputs::Ready(dataset) => {
                assert_eq!(dataset.stores.len(), 2);
                assert_eq!(dataset.routes.len(), 3);
                assert_eq!(dataset.distance.summary().rows, 2);
                assert!(dataset.duration.is_square());
            }
            Inputs::Incomplete { missing } => panic!("Expected ready, missing {missing:?}"),
        }
    }

    #[test]
    fn test_load_every_strict_subset_is_incomplete() {
        let full = uploads(STORES_CSV, ROUTES_CSV);
        for mask in 0u8..15 {
            let mut partial = full.clone();
            for (bit, slot) in UploadSlot::ALL.into_iter().enumerate() {
                if mask & (1 << bit) == 0 {
                    partial.clear(slot);
                }
            }
            match load(&partial).unwrap() {
                Inputs::Incomplete { missing } => {
                    assert_eq!(missing, partial.missing());
                    assert!(!missing.is_empty());
                }
                Inputs::Ready(_) => panic!("Subset {mask:04b} should be incomplete"),
            }
        }
    }

    #[test]
    fn test_incomplete_does_not_parse() {
        let mut uploads = Uploads::default();
        uploads.set(UploadSlot::Geocode, Upload::new("broken.csv", b"\xff\xfe garbage".to_vec()));
        match load(&uploads).unwrap() {
            Inputs::Incomplete { missing } => assert_eq!(
                missing,
                vec![
                    UploadSlot::Routes,
                    UploadSlot::DistanceMatrix,
                    UploadSlot::DurationMatrix
                ]
            ),
            Inputs::Ready(_) => panic!("Expected incomplete"),
        }
    }

    #[test]
    fn test_malformed_matrix_names_the_slot() {
        let mut uploads = uploads(STORES_CSV, ROUTES_CSV);
        uploads.set(UploadSlot::DurationMatrix, Upload::new("duration.npy", b"not numpy".to_vec()));
        let err = load(&uploads).unwrap_err();
        assert_eq!(err.to_string(), "duration matrix: not a .npy file (bad magic)");
    }

    #[test]
    fn test_upload_replaces_previous() {
        let mut uploads = Uploads::default();
        uploads.set(UploadSlot::Routes, Upload::new("old.csv", b"old".to_vec()));
        uploads.set(UploadSlot::Routes, Upload::new("new.csv", b"new".to_vec()));
        assert_eq!(uploads.get(UploadSlot::Routes).unwrap().file_name, "new.csv");
        uploads.clear(UploadSlot::Routes);
        assert!(uploads.get(UploadSlot::Routes).is_none());
        assert_eq!(uploads.missing(), UploadSlot::ALL.to_vec());
    }

    #[test]
    fn test_slot_names_round_trip() {
        for slot in UploadSlot::ALL {
            assert_eq!(slot.key().parse::<UploadSlot>(), Ok(slot));
        }
        assert!("stores".parse::<UploadSlot>().is_err());
    }

    #[test]
    fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stores.csv");
        std::fs::write(&path, STORES_CSV).unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "stores.csv");
        assert_eq!(&upload.bytes[..], STORES_CSV.as_bytes());

        assert!(matches!(
            Upload::from_path(&dir.path().join("absent.csv")),
            Err(Error::Io(_))
        ));
    }
}
