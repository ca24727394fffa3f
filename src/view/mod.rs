//! Views derived from a loaded dataset
//!
//! - `join` - route stops joined to store coordinates, grouped per vehicle
//! - `table` - the selected vehicle's rows and maps link
//! - `map` - Leaflet paths and markers
//! - `plot` - longitude/latitude chart rendered to SVG
//! - `page` - the pure `render` step assembling all of the above
//! - `html` - the HTML document for a rendered page

pub mod html;
pub mod join;
pub mod map;
pub mod page;
pub mod plot;
pub mod table;

pub use html::{dashboard_page, error_page, standalone_page, PageMode, StandalonePage};
pub use join::{join_routes, LatLon, VehicleRoute};
pub use map::{color_for, MapLayer, MapView, PaletteColor, PALETTE};
pub use page::{render, sidebar_files, Dashboard, DeliveryDay, PageState, Selections, UploadedFile, ViewModel};
pub use plot::{PlotSeries, PlotView};
pub use table::{RouteTableView, TableRow};
