//! HTML document for a [`ViewModel`]
//!
//! A sidebar (uploads, day selector) and a main column (status banner, route
//! table, Leaflet map, static chart). The map's layers are embedded as JSON
//! and drawn client-side by Leaflet; the chart is inlined SVG.

use std::fmt::Write;

use crate::core::error::Result;

use super::map::MapView;
use super::page::{
    Dashboard, DeliveryDay, PageState, UploadedFile, ViewModel, INCOMPLETE_MESSAGE, SUCCESS_MESSAGE,
};
use super::table::RouteTableView;

pub const PAGE_TITLE: &str = "Delivery Route Optimization Dashboard";

/// Whether the page talks back to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Served by `delivery-dash serve`: upload, clear and selector forms are live
    Interactive,
    /// Written by `delivery-dash render`: a read-only snapshot
    Standalone,
}

/// Full page for a successfully rendered view
pub fn dashboard_page(view: &ViewModel, plot_svg: Option<&str>, mode: PageMode) -> String {
    let mut main = String::new();
    match &view.state {
        PageState::Incomplete { .. } => {
            let _ = write!(main, r#"<div class="banner warning">⚠️ {}</div>"#, escape(INCOMPLETE_MESSAGE));
        }
        PageState::Ready(dashboard) => {
            let _ = write!(main, r#"<div class="banner success">✅ {}</div>"#, escape(SUCCESS_MESSAGE));
            write_dashboard(&mut main, dashboard, view.day, plot_svg, mode);
        }
    }
    document(&view.files, view.day, &main, mode)
}

/// A read-only page with its chart, as written by `delivery-dash render`
#[derive(Debug, Clone)]
pub struct StandalonePage {
    pub html: String,
    pub plot_svg: Option<String>,
}

pub fn standalone_page(view: &ViewModel) -> Result<StandalonePage> {
    let plot_svg = view.dashboard().map(|d| d.plot.to_svg()).transpose()?;
    Ok(StandalonePage {
        html: dashboard_page(view, plot_svg.as_deref(), PageMode::Standalone),
        plot_svg,
    })
}

/// Page for a render that failed (malformed upload); the sidebar stays usable
pub fn error_page(files: &[UploadedFile], day: DeliveryDay, message: &str, mode: PageMode) -> String {
    let main = format!(
        r#"<div class="banner error">❌ Could not load the uploaded files: {}</div>"#,
        escape(message)
    );
    document(files, day, &main, mode)
}

fn document(files: &[UploadedFile], day: DeliveryDay, main: &str, mode: PageMode) -> String {
    let mut sidebar = String::new();
    write_sidebar(&mut sidebar, files, day, mode);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{title}</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
    integrity="sha256-p4NxAoJBhIIN+hmNHrzRCf9tD/miZyoHS5obTRR9BMY=" crossorigin="" />
  <style>{css}</style>
</head>
<body>
  <aside id="sidebar">{sidebar}</aside>
  <main id="content">
    <h1>🧠 {title}</h1>
    {main}
  </main>
</body>
</html>
"#,
        title = PAGE_TITLE,
        css = STYLE,
    )
}

fn write_sidebar(out: &mut String, files: &[UploadedFile], day: DeliveryDay, mode: PageMode) {
    out.push_str("<h2>📂 Upload Your Files</h2>");

    match mode {
        PageMode::Interactive => {
            out.push_str(r#"<form method="post" action="/upload" enctype="multipart/form-data">"#);
            let _ = write!(out, r#"<input type="hidden" name="day" value="{}" />"#, day);
            for file in files {
                let slot = file.slot;
                let _ = write!(
                    out,
                    r#"<label for="{key}">{label}</label><input type="file" id="{key}" name="{key}" accept="{accept}" />"#,
                    key = slot.key(),
                    label = escape(slot.label()),
                    accept = slot.accept(),
                );
            }
            out.push_str(r#"<button type="submit">Upload</button></form>"#);
        }
        PageMode::Standalone => {}
    }

    out.push_str(r#"<ul class="files">"#);
    for file in files {
        match &file.file_name {
            Some(name) => {
                let _ = write!(out, "<li>✔ {}: {}", escape(file.slot.label()), escape(name));
                if mode == PageMode::Interactive {
                    let _ = write!(
                        out,
                        r#"<form method="post" action="/clear/{}" class="inline"><input type="hidden" name="day" value="{}" /><button type="submit" title="Remove">✕</button></form>"#,
                        file.slot.key(),
                        day
                    );
                }
                out.push_str("</li>");
            }
            None => {
                let _ = write!(out, r#"<li class="missing">✘ {}</li>"#, escape(file.slot.label()));
            }
        }
    }
    out.push_str("</ul>");

    if mode == PageMode::Interactive {
        out.push_str(r#"<form method="get" action="/"><label for="day">Select Delivery Day</label><select id="day" name="day" onchange="this.form.submit()">"#);
        for option in DeliveryDay::ALL {
            let selected = if option == day { " selected" } else { "" };
            let _ = write!(out, r#"<option value="{option}"{selected}>{option}</option>"#);
        }
        out.push_str(r#"</select><noscript><button type="submit">Apply</button></noscript></form>"#);
    }
    let _ = write!(out, "<p><strong>Selected Day:</strong> {day}</p>");
}

fn write_dashboard(out: &mut String, dashboard: &Dashboard, day: DeliveryDay, plot_svg: Option<&str>, mode: PageMode) {
    let m = &dashboard.matrices;
    let _ = write!(
        out,
        r#"<p class="matrices">Distance matrix {}×{}, duration matrix {}×{}</p>"#,
        m.distance.rows, m.distance.cols, m.duration.rows, m.duration.cols
    );

    out.push_str("<section><h2>📋 Route Summary Table</h2>");
    write_table(out, &dashboard.table, day, mode);
    out.push_str("</section>");

    out.push_str("<section><h2>🗺️ Optimized Routes on Map</h2>");
    write_map(out, &dashboard.map);
    out.push_str("</section>");

    out.push_str(r#"<section><h2>📍 Route Overview (Scatter Plot)</h2><div class="plot">"#);
    match (plot_svg, mode) {
        (Some(svg), _) => out.push_str(svg),
        (None, PageMode::Interactive) => {
            out.push_str(r#"<img src="/plot.svg" alt="Route overview chart" />"#);
        }
        (None, PageMode::Standalone) => {}
    }
    out.push_str("</div></section>");
}

fn write_table(out: &mut String, table: &RouteTableView, day: DeliveryDay, mode: PageMode) {
    match mode {
        PageMode::Interactive => {
            out.push_str(r#"<form method="get" action="/"><label for="vehicle">Select a Vehicle to View its Route</label>"#);
            let _ = write!(out, r#"<input type="hidden" name="day" value="{day}" />"#);
            out.push_str(r#"<select id="vehicle" name="vehicle" onchange="this.form.submit()">"#);
            for vehicle in &table.vehicles {
                let selected = if Some(*vehicle) == table.selected { " selected" } else { "" };
                let _ = write!(out, r#"<option value="{vehicle}"{selected}>{vehicle}</option>"#);
            }
            out.push_str(r#"</select><noscript><button type="submit">Show</button></noscript></form>"#);
        }
        PageMode::Standalone => {
            if let Some(vehicle) = table.selected {
                let _ = write!(out, "<p>Vehicle {vehicle}</p>");
            }
        }
    }

    out.push_str(r#"<table class="route"><thead><tr><th></th>"#);
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", escape(column));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        let _ = write!(out, "<tr><th>{}</th>", row.index);
        for cell in &row.cells {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");

    if let Some(link) = &table.maps_link {
        if is_safe_href(link) {
            let _ = write!(
                out,
                r#"<p><a href="{}" target="_blank" rel="noopener noreferrer">📍 View Route on Google Maps</a></p>"#,
                escape(link)
            );
        } else {
            let _ = write!(out, "<p>📍 {}</p>", escape(link));
        }
    }
}

fn write_map(out: &mut String, map: &MapView) {
    let json = serde_json::to_string(map).unwrap_or_else(|_| "null".to_string());
    let _ = write!(
        out,
        r#"<div id="map"></div>
<script type="application/json" id="map-data">{}</script>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
  integrity="sha256-20nQCchB9co0qIjJZRGuk2/Z9VM+kNiyxNV1lvTlZBo=" crossorigin=""></script>
<script>{}</script>"#,
        script_safe_json(&json),
        MAP_SCRIPT
    );
}

const MAP_SCRIPT: &str = r#"
(function () {
  const data = JSON.parse(document.getElementById('map-data').textContent);
  if (!data) { return; }
  const map = L.map('map').setView([data.center.lat, data.center.lon], data.zoom);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 19,
    attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
  }).addTo(map);
  for (const layer of data.layers) {
    if (layer.kind === 'path') {
      L.polyline(layer.points.map(p => [p.lat, p.lon]), {
        color: layer.color, weight: layer.weight, opacity: layer.opacity
      }).bindTooltip(layer.label).addTo(map);
    } else if (layer.kind === 'marker') {
      L.circleMarker([layer.at.lat, layer.at.lon], {
        radius: layer.radius, color: layer.color, fill: true, fillColor: layer.color
      }).addTo(map);
    }
  }
})();
"#;

const STYLE: &str = r#"
  html, body { margin: 0; height: 100%; font-family: system-ui, sans-serif; }
  body { display: flex; }
  #sidebar { width: 300px; flex-shrink: 0; padding: 16px; background: #f0f2f6; overflow-y: auto; }
  #sidebar label { display: block; margin-top: 12px; font-size: 0.9em; }
  #sidebar button { margin-top: 12px; }
  #content { flex-grow: 1; padding: 16px 32px; overflow-y: auto; }
  .banner { padding: 12px 16px; border-radius: 6px; margin: 12px 0; }
  .success { background: #dff3e4; color: #1b5e20; }
  .warning { background: #fff8db; color: #7a5b00; }
  .error { background: #fde2e1; color: #8a1c12; }
  .files { list-style: none; padding: 0; font-size: 0.85em; }
  .files .missing { color: #999; }
  form.inline { display: inline; }
  form.inline button { margin: 0 0 0 6px; }
  table.route { border-collapse: collapse; margin: 12px 0; }
  table.route th, table.route td { border: 1px solid #ddd; padding: 4px 8px; text-align: left; }
  #map { width: 1000px; max-width: 100%; height: 600px; }
  .plot svg, .plot img { max-width: 100%; height: auto; }
  .matrices { color: #555; font-size: 0.85em; }
"#;

/// Escape text for HTML element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON that cannot terminate the enclosing `<script>` element
fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c").replace('>', "\\u003e").replace('&', "\\u0026")
}

/// Links are opaque, but script-bearing schemes never become clickable
fn is_safe_href(link: &str) -> bool {
    let scheme = link
        .split_once(':')
        .map(|(scheme, _)| scheme.trim().to_ascii_lowercase())
        .unwrap_or_default();
    !matches!(scheme.as_str(), "javascript" | "data" | "vbscript")
}
