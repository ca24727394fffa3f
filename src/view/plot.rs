//! Static plot renderer - longitude/latitude chart of every route, as SVG
//!
//! Mirrors the map's join but plots (longitude, latitude), one line-with-
//! markers series per vehicle, colored by the chart palette in series order.

use plotters::prelude::*;
use serde::Serialize;
use std::ops::Range;
use utoipa::ToSchema;

use crate::core::error::{Error, Result};

use super::join::VehicleRoute;

pub const PLOT_TITLE: &str = "Optimized Vehicle Routes";
pub const X_LABEL: &str = "Longitude";
pub const Y_LABEL: &str = "Latitude";
pub const PLOT_SIZE: (u32, u32) = (1000, 800);

/// One vehicle's points as `[longitude, latitude]`
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlotSeries {
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlotView {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<PlotSeries>,
}

impl PlotView {
    pub fn build(routes: &[VehicleRoute]) -> Self {
        let series = routes
            .iter()
            .map(|r| PlotSeries {
                label: r.label(),
                points: r.coords.iter().filter(|c| c.is_finite()).map(|c| [c.lon, c.lat]).collect(),
            })
            .filter(|s| !s.points.is_empty())
            .collect();

        Self {
            title: PLOT_TITLE.to_string(),
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            series,
        }
    }

    /// Axis ranges covering every finite point with a 5% margin
    ///
    /// Always finite: plotters cannot lay out ticks on an infinite axis.
    pub fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let mut points = self
            .series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|p| p[0].is_finite() && p[1].is_finite());
        let Some(first) = points.next() else {
            return (0.0..1.0, 0.0..1.0);
        };

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first[0], first[0], first[1], first[1]);
        for p in points {
            min_x = min_x.min(p[0]);
            max_x = max_x.max(p[0]);
            min_y = min_y.min(p[1]);
            max_y = max_y.max(p[1]);
        }

        (padded(min_x, max_x), padded(min_y, max_y))
    }

    /// Render the chart as a standalone SVG document
    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, PLOT_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(chart_err)?;

            let (x_range, y_range) = self.bounds();
            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(&self.title, ("sans-serif", 28).into_font())
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(x_range, y_range)
                .map_err(chart_err)?;

            chart
                .configure_mesh()
                .x_desc(self.x_label.as_str())
                .y_desc(self.y_label.as_str())
                .x_label_formatter(&|x| format!("{x:.3}"))
                .y_label_formatter(&|y| format!("{y:.3}"))
                .draw()
                .map_err(chart_err)?;

            for (idx, series) in self.series.iter().enumerate() {
                let color = Palette99::pick(idx).to_rgba();
                let points: Vec<(f64, f64)> = series
                    .points
                    .iter()
                    .filter(|p| p[0].is_finite() && p[1].is_finite())
                    .map(|p| (p[0], p[1]))
                    .collect();

                chart
                    .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
                    .map_err(chart_err)?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, 4, color.filled())))
                    .map_err(chart_err)?;
            }

            if !self.series.is_empty() {
                chart
                    .configure_series_labels()
                    .background_style(WHITE.mix(0.85))
                    .border_style(BLACK)
                    .draw()
                    .map_err(chart_err)?;
            }

            root.present().map_err(chart_err)?;
        }
        Ok(svg)
    }
}

fn padded(min: f64, max: f64) -> Range<f64> {
    let pad = ((max - min) * 0.05).max(0.001);
    let (start, end) = (min - pad, max + pad);
    if start.is_finite() && end.is_finite() {
        start..end
    } else {
        min.max(f64::MIN / 2.0)..max.min(f64::MAX / 2.0)
    }
}

fn chart_err<E: std::error::Error>(e: E) -> Error {
    Error::Chart(e.to_string())
}
