//! Per-vehicle lenient join of route stops onto store coordinates
//!
//! Shared by the map and the static plot. Vehicles come out in first-seen
//! order of the routes table; stops keep their row order; a stop whose store
//! name has no geocode row, or whose coordinates are not finite (`inf`, `NaN`),
//! is dropped without comment.

use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::core::model::{GeocodeTable, RouteStop, RoutesTable, Store, VehicleId};

/// WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// Both components are real numbers; `inf` and `NaN` cannot be drawn
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<&Store> for LatLon {
    fn from(store: &Store) -> Self {
        Self {
            lat: store.lat,
            lon: store.lon,
        }
    }
}

/// Ordered coordinates of one vehicle's resolvable stops
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRoute {
    pub vehicle: VehicleId,
    pub coords: Vec<LatLon>,
}

impl VehicleRoute {
    pub fn label(&self) -> String {
        vehicle_label(self.vehicle)
    }
}

/// Legend / tooltip text for a vehicle
pub fn vehicle_label(vehicle: VehicleId) -> String {
    format!("Vehicle {vehicle}")
}

/// Distinct vehicle IDs in the order they first appear
pub fn vehicle_ids(routes: &RoutesTable) -> Vec<VehicleId> {
    group_by_vehicle(routes).into_iter().map(|(id, _)| id).collect()
}

/// Rows of the routes table grouped per vehicle, groups in first-seen order
pub fn group_by_vehicle(routes: &RoutesTable) -> Vec<(VehicleId, Vec<&RouteStop>)> {
    let mut positions: HashMap<VehicleId, usize> = HashMap::new();
    let mut groups: Vec<(VehicleId, Vec<&RouteStop>)> = Vec::new();

    for stop in &routes.stops {
        let pos = *positions.entry(stop.vehicle_id).or_insert_with(|| {
            groups.push((stop.vehicle_id, Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(stop);
    }

    groups
}

/// Store lookup by exact name; the first row wins when names repeat
pub struct StoreIndex<'a> {
    by_name: HashMap<&'a str, &'a Store>,
}

impl<'a> StoreIndex<'a> {
    pub fn new(stores: &'a GeocodeTable) -> Self {
        let mut by_name = HashMap::with_capacity(stores.len());
        for store in &stores.stores {
            by_name.entry(store.name.as_str()).or_insert(store);
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&'a Store> {
        self.by_name.get(name).copied()
    }
}

/// Resolve every vehicle's stops to coordinates, skipping unknown stores
///
/// Vehicles whose stops all fail to resolve are still returned, with an empty
/// coordinate list; renderers decide what to draw for them.
pub fn join_routes(stores: &GeocodeTable, routes: &RoutesTable) -> Vec<VehicleRoute> {
    let index = StoreIndex::new(stores);

    group_by_vehicle(routes)
        .into_iter()
        .map(|(vehicle, stops)| VehicleRoute {
            vehicle,
            coords: stops
                .iter()
                .filter_map(|stop| index.get(&stop.store_name))
                .map(LatLon::from)
                .filter(LatLon::is_finite)
                .collect(),
        })
        .collect()
}
