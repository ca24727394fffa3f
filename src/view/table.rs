//! Route table view - one vehicle's stops, plus the external maps link

use serde::Serialize;
use utoipa::ToSchema;

use crate::core::model::{RoutesTable, VehicleId};

use super::join::vehicle_ids;

/// One displayed row; `index` is the 0-based position within the selection
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TableRow {
    pub index: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RouteTableView {
    /// Selector options, first-seen order
    pub vehicles: Vec<VehicleId>,
    pub selected: Option<VehicleId>,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Deep link of the first selected row, if non-empty
    pub maps_link: Option<String>,
}

impl RouteTableView {
    /// Build the view for a requested vehicle
    ///
    /// A request that is absent or not among the table's vehicles falls back
    /// to the first vehicle, the way a select box defaults to its first option.
    pub fn build(routes: &RoutesTable, requested: Option<VehicleId>) -> Self {
        let vehicles = vehicle_ids(routes);
        let selected = requested
            .filter(|v| vehicles.contains(v))
            .or_else(|| vehicles.first().copied());

        let (rows, maps_link) = match selected {
            Some(vehicle) => (filter_rows(routes, vehicle), first_link(routes, vehicle)),
            None => (Vec::new(), None),
        };

        Self {
            vehicles,
            selected,
            columns: routes.columns.clone(),
            rows,
            maps_link,
        }
    }
}

/// Rows belonging to `vehicle`, original order, re-indexed from 0
///
/// An unknown vehicle yields an empty table.
pub fn filter_rows(routes: &RoutesTable, vehicle: VehicleId) -> Vec<TableRow> {
    routes
        .stops
        .iter()
        .filter(|stop| stop.vehicle_id == vehicle)
        .enumerate()
        .map(|(index, stop)| TableRow {
            index,
            cells: stop.record.clone(),
        })
        .collect()
}

/// `GoogleMapsLink` of the vehicle's first row; empty links are omitted
pub fn first_link(routes: &RoutesTable, vehicle: VehicleId) -> Option<String> {
    routes
        .stops
        .iter()
        .find(|stop| stop.vehicle_id == vehicle)
        .map(|stop| stop.google_maps_link.trim())
        .filter(|link| !link.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::fixtures::ROUTES_CSV;
    use crate::formats::parse_routes;

    fn routes(csv: &str) -> RoutesTable {
        parse_routes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_select_vehicle_one() {
        let view = RouteTableView::build(&routes(ROUTES_CSV), Some(VehicleId(1)));
        assert_eq!(view.vehicles, vec![VehicleId(1), VehicleId(2)]);
        assert_eq!(view.selected, Some(VehicleId(1)));
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].cells, vec!["1", "A", "linkA"]);
        assert_eq!(view.rows[1].cells, vec!["1", "B", "linkA"]);
        assert_eq!(view.maps_link.as_deref(), Some("linkA"));
    }

    #[test]
    fn test_index_is_reset_and_contiguous() {
        let table = routes("VehicleID,StoreName,GoogleMapsLink\n1,A,x\n2,B,y\n1,C,x\n2,D,y\n2,E,y\n");
        let rows = filter_rows(&table, VehicleId(2));
        let indices: Vec<usize> = rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let names: Vec<&str> = rows.iter().map(|r| r.cells[1].as_str()).collect();
        assert_eq!(names, vec!["B", "D", "E"]);
    }

    #[test]
    fn test_reselect_is_idempotent() {
        let table = routes(ROUTES_CSV);
        let first = RouteTableView::build(&table, Some(VehicleId(2)));
        let second = RouteTableView::build(&table, Some(VehicleId(2)));
        assert_eq!(first, second);
        assert_eq!(first.maps_link.as_deref(), Some("linkB"));
    }

    #[test]
    fn test_unknown_or_missing_selection_falls_back_to_first() {
        let table = routes(ROUTES_CSV);
        assert_eq!(RouteTableView::build(&table, None).selected, Some(VehicleId(1)));
        assert_eq!(
            RouteTableView::build(&table, Some(VehicleId(99))).selected,
            Some(VehicleId(1))
        );
    }

    #[test]
    fn test_vehicle_without_rows_gives_empty_table() {
        let table = routes(ROUTES_CSV);
        assert!(filter_rows(&table, VehicleId(42)).is_empty());
        assert_eq!(first_link(&table, VehicleId(42)), None);

        let empty = RouteTableView::build(&routes("VehicleID,StoreName,GoogleMapsLink\n"), Some(VehicleId(1)));
        assert!(empty.vehicles.is_empty());
        assert_eq!(empty.selected, None);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.maps_link, None);
    }

    #[test]
    fn test_empty_link_is_omitted() {
        let table = routes("VehicleID,StoreName,GoogleMapsLink\n5,A,\n5,B,https://maps.example/5\n");
        let view = RouteTableView::build(&table, Some(VehicleId(5)));
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.maps_link, None);
    }
}
