//! `delivery-dash render`: the dashboard for four files on disk, as one HTML page

use anyhow::{Context, Result};
use clap::Args;
use delivery_dash::view::html::standalone_page;
use delivery_dash::{render, DeliveryDay, Selections, Upload, UploadSlot, Uploads, VehicleId};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Geocoded store data (CSV with StoreName, Latitude, Longitude)
    #[arg(long)]
    pub geocode: PathBuf,

    /// Optimized routes (CSV with VehicleID, StoreName, GoogleMapsLink)
    #[arg(long)]
    pub routes: PathBuf,

    /// Distance matrix (.npy)
    #[arg(long)]
    pub distance: PathBuf,

    /// Duration matrix (.npy)
    #[arg(long)]
    pub duration: PathBuf,

    /// Vehicle whose rows fill the route table (default: first in the routes file)
    #[arg(long)]
    pub vehicle: Option<i64>,

    /// Delivery day shown on the page
    #[arg(long, default_value = "Monday")]
    pub day: DeliveryDay,

    /// Output HTML page
    #[arg(short, long, default_value = "dashboard.html")]
    pub output: PathBuf,

    /// Also write the route overview chart to this SVG file
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

impl RenderArgs {
    fn inputs(&self) -> [(UploadSlot, &Path); 4] {
        [
            (UploadSlot::Geocode, self.geocode.as_path()),
            (UploadSlot::Routes, self.routes.as_path()),
            (UploadSlot::DistanceMatrix, self.distance.as_path()),
            (UploadSlot::DurationMatrix, self.duration.as_path()),
        ]
    }
}

pub fn run_render(args: &RenderArgs) -> Result<()> {
    let mut uploads = Uploads::default();
    for (slot, path) in args.inputs() {
        let upload = Upload::from_path(path).with_context(|| format!("Failed to read {}", path.display()))?;
        uploads.set(slot, upload);
    }

    let selections = Selections {
        vehicle: args.vehicle.map(VehicleId),
        day: args.day,
    };
    let view = render(&uploads, &selections).context("Failed to load input files")?;
    let page = standalone_page(&view)?;

    std::fs::write(&args.output, &page.html)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), bytes = page.html.len(), "Wrote dashboard page");
    eprintln!("✅ Dashboard written to {}", args.output.display());

    if let (Some(path), Some(svg)) = (&args.plot, &page.plot_svg) {
        std::fs::write(path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote route chart");
        eprintln!("📍 Chart written to {}", path.display());
    }

    Ok(())
}
