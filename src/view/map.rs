//! Map renderer - Leaflet primitives for every vehicle's route
//!
//! The map is centered on the first geocode row with finite coordinates. Each vehicle with at least
//! one resolvable stop gets its palette color (by `VehicleID` modulo the
//! palette size), a path through its stops and a small filled circle per stop.

use serde::Serialize;
use utoipa::ToSchema;

use crate::core::model::{GeocodeTable, VehicleId};

use super::join::{LatLon, VehicleRoute};

/// Zoom level of a map centered on the first store
pub const DEFAULT_ZOOM: u8 = 13;
/// Zoom level used when there is no store to center on
pub const WORLD_ZOOM: u8 = 2;

pub const PATH_WEIGHT: f64 = 5.0;
pub const PATH_OPACITY: f64 = 0.8;
pub const MARKER_RADIUS: u32 = 4;

/// A named route color and the CSS value Leaflet draws it with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    pub name: &'static str,
    pub css: &'static str,
}

const fn color(name: &'static str, css: &'static str) -> PaletteColor {
    PaletteColor { name, css }
}

/// Route colors, indexed by `VehicleID mod PALETTE.len()`
pub const PALETTE: [PaletteColor; 19] = [
    color("red", "#d63e2a"),
    color("blue", "#38aadd"),
    color("green", "#72b026"),
    color("purple", "#d252b9"),
    color("orange", "#f69730"),
    color("darkred", "#a23336"),
    color("lightred", "#ff8e7f"),
    color("beige", "#ffcb92"),
    color("darkblue", "#0067a3"),
    color("darkgreen", "#728224"),
    color("cadetblue", "#436978"),
    color("darkpurple", "#5b396b"),
    color("white", "#ffffff"),
    color("pink", "#ff91ea"),
    color("lightblue", "#8adaff"),
    color("lightgreen", "#bbf970"),
    color("gray", "#575757"),
    color("black", "#303030"),
    color("lightgray", "#a3a3a3"),
];

/// Palette entry for a vehicle; IDs past the palette size wrap around
pub fn color_for(vehicle: VehicleId) -> PaletteColor {
    let idx = vehicle.0.rem_euclid(PALETTE.len() as i64) as usize;
    PALETTE[idx]
}

/// One draw call on the map
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapLayer {
    Path {
        vehicle: VehicleId,
        label: String,
        color: String,
        color_name: String,
        points: Vec<LatLon>,
        weight: f64,
        opacity: f64,
    },
    Marker {
        vehicle: VehicleId,
        at: LatLon,
        color: String,
        radius: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapView {
    pub center: LatLon,
    pub zoom: u8,
    /// Draw order: per vehicle in first-seen order, its path then its markers
    pub layers: Vec<MapLayer>,
}

impl MapView {
    pub fn build(stores: &GeocodeTable, routes: &[VehicleRoute]) -> Self {
        let center = stores.stores.iter().map(LatLon::from).find(LatLon::is_finite);
        let (center, zoom) = match center {
            Some(center) => (center, DEFAULT_ZOOM),
            None => (LatLon { lat: 0.0, lon: 0.0 }, WORLD_ZOOM),
        };

        let mut layers = Vec::new();
        for route in routes.iter().filter(|r| !r.coords.is_empty()) {
            let palette = color_for(route.vehicle);

            // A single point makes an invisible polyline; its marker is enough
            if route.coords.len() >= 2 {
                layers.push(MapLayer::Path {
                    vehicle: route.vehicle,
                    label: route.label(),
                    color: palette.css.to_string(),
                    color_name: palette.name.to_string(),
                    points: route.coords.clone(),
                    weight: PATH_WEIGHT,
                    opacity: PATH_OPACITY,
                });
            }

            layers.extend(route.coords.iter().map(|&at| MapLayer::Marker {
                vehicle: route.vehicle,
                at,
                color: palette.css.to_string(),
                radius: MARKER_RADIUS,
            }));
        }

        Self {
            center,
            zoom,
            layers,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter().filter(|l| matches!(l, MapLayer::Path { .. }))
    }

    pub fn markers(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter().filter(|l| matches!(l, MapLayer::Marker { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::fixtures::{dataset, ROUTES_CSV, STORES_CSV};
    use crate::view::join::join_routes;

    fn layer_color(layer: &MapLayer) -> &str {
        match layer {
            MapLayer::Path { color, .. } | MapLayer::Marker { color, .. } => color,
        }
    }

    fn layer_vehicle(layer: &MapLayer) -> VehicleId {
        match layer {
            MapLayer::Path { vehicle, .. } | MapLayer::Marker { vehicle, .. } => *vehicle,
        }
    }

    #[test]
    fn test_palette_wraps_by_modulo() {
        assert_eq!(PALETTE.len(), 19);
        for k in [0i64, 1, 5, 18, 19, 40] {
            assert_eq!(color_for(VehicleId(k)), color_for(VehicleId(k + 19)));
        }
        assert_eq!(color_for(VehicleId(1)).name, "blue");
        assert_eq!(color_for(VehicleId(20)).name, "blue");
        assert_eq!(color_for(VehicleId(-1)).name, "lightgray");
    }

    #[test]
    fn test_centered_on_first_store() {
        let data = dataset(STORES_CSV, ROUTES_CSV);
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));
        assert_eq!(map.center, LatLon { lat: 10.0, lon: 20.0 });
        assert_eq!(map.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_center_skips_non_finite_rows() {
        let data = dataset(
            "StoreName,Latitude,Longitude\nA,inf,20.0\nB,10.1,20.1\n",
            ROUTES_CSV,
        );
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));
        assert_eq!(map.center, LatLon { lat: 10.1, lon: 20.1 });
        assert_eq!(map.zoom, DEFAULT_ZOOM);
        assert!(map.paths().next().is_none());

        let data = dataset("StoreName,Latitude,Longitude\nA,NaN,-inf\n", ROUTES_CSV);
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));
        assert_eq!(map.zoom, WORLD_ZOOM);
        assert!(map.layers.is_empty());
    }

    #[test]
    fn test_scenario_two_vehicles() {
        let data = dataset(STORES_CSV, ROUTES_CSV);
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));

        let paths: Vec<&MapLayer> = map.paths().collect();
        assert_eq!(paths.len(), 1);
        match paths[0] {
            MapLayer::Path {
                vehicle,
                label,
                points,
                color,
                ..
            } => {
                assert_eq!(*vehicle, VehicleId(1));
                assert_eq!(label, "Vehicle 1");
                assert_eq!(points.len(), 2);
                assert_eq!(color, color_for(VehicleId(1)).css);
            }
            MapLayer::Marker { .. } => unreachable!(),
        }

        let markers: Vec<&MapLayer> = map.markers().collect();
        assert_eq!(markers.len(), 3);
        let v2: Vec<&&MapLayer> = markers.iter().filter(|m| layer_vehicle(m) == VehicleId(2)).collect();
        assert_eq!(v2.len(), 1);
        assert_ne!(layer_color(v2[0]), layer_color(paths[0]));
    }

    #[test]
    fn test_markers_share_path_color_and_follow_path() {
        let data = dataset(STORES_CSV, ROUTES_CSV);
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));
        assert!(matches!(map.layers[0], MapLayer::Path { .. }));
        for layer in &map.layers[1..3] {
            assert_eq!(layer_vehicle(layer), VehicleId(1));
            assert_eq!(layer_color(layer), layer_color(&map.layers[0]));
        }
    }

    #[test]
    fn test_unresolvable_vehicle_draws_nothing() {
        let data = dataset(
            STORES_CSV,
            "VehicleID,StoreName,GoogleMapsLink\n1,A,\n1,C,\n1,B,\n3,Z,\n",
        );
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));
        assert!(map.layers.iter().all(|l| layer_vehicle(l) == VehicleId(1)));
        match map.paths().next() {
            Some(MapLayer::Path { points, .. }) => assert_eq!(
                points,
                &vec![LatLon { lat: 10.0, lon: 20.0 }, LatLon { lat: 10.1, lon: 20.1 }]
            ),
            other => panic!("Expected a path, got {other:?}"),
        };
    }

    #[test]
    fn test_empty_geocode_uses_world_view() {
        let data = dataset("StoreName,Latitude,Longitude\n", ROUTES_CSV);
        let map = MapView::build(&data.stores, &join_routes(&data.stores, &data.routes));
        assert_eq!(map.zoom, WORLD_ZOOM);
        assert!(map.layers.is_empty());
    }

    #[test]
    fn test_layer_json_shape() {
        let layer = MapLayer::Marker {
            vehicle: VehicleId(3),
            at: LatLon { lat: 1.0, lon: 2.0 },
            color: "#d252b9".to_string(),
            radius: MARKER_RADIUS,
        };
        assert_eq!(
            serde_json::to_value(&layer).unwrap(),
            serde_json::json!({
                "kind": "marker",
                "vehicle": 3,
                "at": {"lat": 1.0, "lon": 2.0},
                "color": "#d252b9",
                "radius": 4
            })
        );
    }
}
