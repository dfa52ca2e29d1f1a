//! Dashboard charts.
//!
//! The four charts are fixed sample configurations in the shape Chart.js expects. Drawing them
//! is left to a `ChartRenderer`, so that the dashboard can run without a charting library.

use anyhow::Result;
use ego_tree::NodeId;
use log::{debug, warn};
use serde_json::{json, Value};

use crate::dom::Document;

pub mod colors {
    pub const PRIMARY: &str = "#3b82f6";
    pub const PRIMARY_LIGHT: &str = "#93c5fd";
    pub const SECONDARY: &str = "#f97316";
    pub const SUCCESS: &str = "#22c55e";
    pub const WARNING: &str = "#f59e0b";
    pub const ERROR: &str = "#ef4444";
    pub const NEUTRAL: &str = "#94a3b8";
}

pub const FONT_FAMILY: &str = "'Inter', sans-serif";

/// Draws a chart on a canvas element.
pub trait ChartRenderer {
    fn render(&mut self, doc: &mut Document, canvas: NodeId, config: &Value) -> Result<()>;
}

/// Hands the configuration over to the page script through a `data-chart-config` attribute.
#[derive(Debug, Default)]
pub struct DomChartBinder;

impl ChartRenderer for DomChartBinder {
    fn render(&mut self, doc: &mut Document, canvas: NodeId, config: &Value) -> Result<()> {
        doc.set_attr(canvas, "data-chart-config", &serde_json::to_string(config)?);
        Ok(())
    }
}

fn hidden_x_grid() -> Value {
    json!({ "grid": { "display": false } })
}

fn light_y_grid() -> Value {
    json!({ "beginAtZero": true, "grid": { "color": "rgba(0, 0, 0, 0.05)" } })
}

pub fn inspections_chart() -> Value {
    json!({
        "type": "line",
        "data": {
            "labels": ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"],
            "datasets": [{
                "label": "Inspections Completed",
                "data": [45, 52, 48, 65, 72, 68, 75, 82, 78, 85, 90, 88],
                "borderColor": colors::PRIMARY,
                "backgroundColor": "rgba(59, 130, 246, 0.1)",
                "borderWidth": 2,
                "fill": true,
                "tension": 0.4
            }, {
                "label": "Scheduled",
                "data": [50, 55, 52, 70, 75, 72, 78, 85, 82, 88, 92, 90],
                "borderColor": colors::SECONDARY,
                "backgroundColor": "transparent",
                "borderWidth": 2,
                "borderDash": [5, 5],
                "tension": 0.4
            }]
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": {
                "legend": {
                    "position": "top",
                    "align": "end",
                    "labels": { "usePointStyle": true, "font": { "family": FONT_FAMILY } }
                }
            },
            "scales": { "y": light_y_grid(), "x": hidden_x_grid() }
        }
    })
}

pub fn integrity_chart() -> Value {
    json!({
        "type": "doughnut",
        "data": {
            "labels": ["Excellent", "Good", "Fair", "Poor", "Critical"],
            "datasets": [{
                "data": [35, 40, 15, 7, 3],
                "backgroundColor": [colors::SUCCESS, colors::PRIMARY, colors::WARNING, colors::SECONDARY, colors::ERROR],
                "borderWidth": 0
            }]
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "cutout": "70%",
            "plugins": {
                "legend": {
                    "position": "bottom",
                    "labels": { "usePointStyle": true, "padding": 20, "font": { "family": FONT_FAMILY } }
                }
            }
        }
    })
}

pub fn defects_chart() -> Value {
    json!({
        "type": "bar",
        "data": {
            "labels": ["Metal Loss", "Cracks", "Dents", "Lamination", "Gouges", "Other"],
            "datasets": [{
                "label": "Detected Defects",
                "data": [145, 32, 28, 15, 22, 18],
                "backgroundColor": colors::PRIMARY,
                "borderRadius": 4
            }]
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "display": false } },
            "scales": { "y": light_y_grid(), "x": hidden_x_grid() }
        }
    })
}

pub fn activity_chart() -> Value {
    json!({
        "type": "line",
        "data": {
            "labels": ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            "datasets": [{
                "label": "Activity",
                "data": [12, 19, 15, 25, 22, 30, 28],
                "borderColor": colors::SECONDARY,
                "backgroundColor": "rgba(249, 115, 22, 0.1)",
                "borderWidth": 2,
                "fill": true,
                "tension": 0.4
            }]
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": { "legend": { "display": false } },
            "scales": { "y": { "display": false }, "x": hidden_x_grid() }
        }
    })
}

/// Canvas ids and configurations of all dashboard charts.
pub fn all_charts() -> Vec<(&'static str, Value)> {
    vec![
        ("inspectionsChart", inspections_chart()),
        ("integrityChart", integrity_chart()),
        ("defectsChart", defects_chart()),
        ("activityChart", activity_chart()),
    ]
}

/// Renders the charts whose canvas is present in the page. Returns the ids of rendered charts.
pub fn init_charts(doc: &mut Document, renderer: Option<&mut dyn ChartRenderer>) -> Result<Vec<&'static str>> {
    let mut rendered = Vec::new();
    let renderer = match renderer {
        Some(renderer) => renderer,
        None => {
            if doc.select_first("canvas")?.is_some() {
                warn!("Chart.js not loaded");
            }
            return Ok(rendered);
        }
    };

    for (id, config) in all_charts() {
        match doc.select_first(&format!("#{}", id))? {
            Some(canvas) => {
                renderer.render(doc, canvas, &config)?;
                rendered.push(id);
            }
            None => debug!("No canvas for chart '{}'", id),
        }
    }
    Ok(rendered)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bind_charts_present_in_page() -> Result<()> {
        let mut doc = Document::parse(
            r#"<html><body><canvas id="inspectionsChart"></canvas><canvas id="defectsChart"></canvas></body></html>"#
        );

        assert!(init_charts(&mut doc, None)?.is_empty());

        let rendered = init_charts(&mut doc, Some(&mut DomChartBinder))?;
        assert_eq!(vec!["inspectionsChart", "defectsChart"], rendered);

        let canvas = doc.select_first("#defectsChart")?.unwrap();
        let config: Value = serde_json::from_str(doc.attr(canvas, "data-chart-config").unwrap())?;
        assert_eq!("bar", config["type"]);
        assert_eq!(json!([145, 32, 28, 15, 22, 18]), config["data"]["datasets"][0]["data"]);
        Ok(())
    }

    #[test]
    fn test_palette() {
        let integrity = integrity_chart();
        assert_eq!(colors::SUCCESS, integrity["data"]["datasets"][0]["backgroundColor"][0]);
        assert_eq!("70%", integrity["options"]["cutout"]);
    }
}
