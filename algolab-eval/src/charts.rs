//! Declarative chart descriptors for plotting-ready payloads.
//!
//! A pure, total, stateless transform from a loosely structured payload
//! (arrays plus optional title/axis labels) into one of three canonical
//! shapes. Scatter and line share the point-series shape and differ only
//! in the `mode` flag; heatmap wraps a 2-D numeric matrix. The adapter
//! emits renderer-agnostic data, never pixels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ChartError;

/// The supported chart shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Scatter,
    Line,
    Heatmap,
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scatter" => Ok(Self::Scatter),
            "line" => Ok(Self::Line),
            // Legacy payloads name the heatmap after its main use.
            "heatmap" | "confusion_matrix" => Ok(Self::Heatmap),
            other => Err(ChartError::UnsupportedKind(other.to_string())),
        }
    }
}

/// Point marker styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub size: u32,
}

/// Line styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStyle {
    pub width: u32,
}

/// Series payload specific to the chart kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Series {
    /// Shared by scatter and line charts; `mode` is `"markers"` or
    /// `"lines"`.
    Points {
        x: Vec<f64>,
        y: Vec<f64>,
        mode: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marker: Option<MarkerStyle>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<LineStyle>,
    },
    /// A 2-D numeric grid, rendered as a heatmap.
    Grid {
        z: Vec<Vec<f64>>,
        colorscale: String,
        showscale: bool,
    },
}

/// Title and axis labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

/// A renderer-agnostic description of one plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub series: Series,
    pub layout: Layout,
}

/// Build a chart descriptor for a parsed [`ChartKind`]. Total: missing or
/// malformed payload fields resolve to documented defaults.
pub fn chart_descriptor(kind: ChartKind, payload: &Value) -> ChartDescriptor {
    match kind {
        ChartKind::Scatter => ChartDescriptor {
            kind,
            series: Series::Points {
                x: num_series(payload, "x"),
                y: num_series(payload, "y"),
                mode: "markers".to_string(),
                marker: Some(MarkerStyle { size: 8 }),
                line: None,
            },
            layout: layout(payload, "Scatter Plot", "X", "Y"),
        },
        ChartKind::Line => ChartDescriptor {
            kind,
            series: Series::Points {
                x: num_series(payload, "x"),
                y: num_series(payload, "y"),
                mode: "lines".to_string(),
                marker: None,
                line: Some(LineStyle { width: 2 }),
            },
            layout: layout(payload, "Line Plot", "X", "Y"),
        },
        ChartKind::Heatmap => ChartDescriptor {
            kind,
            series: Series::Grid {
                z: matrix(payload),
                colorscale: "Blues".to_string(),
                showscale: true,
            },
            layout: layout(payload, "Confusion Matrix", "Predicted", "Actual"),
        },
    }
}

/// Parse `kind` and build the descriptor; the only failure mode is an
/// unrecognized kind string.
pub fn chart_descriptor_for(kind: &str, payload: &Value) -> Result<ChartDescriptor, ChartError> {
    Ok(chart_descriptor(kind.parse()?, payload))
}

fn num_series(payload: &Value, key: &str) -> Vec<f64> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

fn matrix(payload: &Value) -> Vec<Vec<f64>> {
    payload
        .get("matrix")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().filter_map(Value::as_f64).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_else(|| vec![vec![0.0]])
}

fn text(payload: &Value, key: &str, default: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn layout(payload: &Value, title: &str, x_label: &str, y_label: &str) -> Layout {
    Layout {
        title: text(payload, "title", title),
        x_label: text(payload, "xlabel", x_label),
        y_label: text(payload, "ylabel", y_label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_parse() {
        assert_eq!("scatter".parse::<ChartKind>(), Ok(ChartKind::Scatter));
        assert_eq!("line".parse::<ChartKind>(), Ok(ChartKind::Line));
        assert_eq!("heatmap".parse::<ChartKind>(), Ok(ChartKind::Heatmap));
        assert_eq!(
            "confusion_matrix".parse::<ChartKind>(),
            Ok(ChartKind::Heatmap)
        );
        assert_eq!(
            "pie".parse::<ChartKind>(),
            Err(ChartError::UnsupportedKind("pie".to_string()))
        );
    }

    #[test]
    fn test_scatter_defaults() {
        let payload = json!({ "x": [1, 2], "y": [3, 4] });
        let chart = chart_descriptor(ChartKind::Scatter, &payload);

        assert_eq!(chart.kind, ChartKind::Scatter);
        assert_eq!(chart.layout.title, "Scatter Plot");
        assert_eq!(chart.layout.x_label, "X");
        assert_eq!(chart.layout.y_label, "Y");
        match chart.series {
            Series::Points {
                x, y, mode, marker, ..
            } => {
                assert_eq!(x, vec![1.0, 2.0]);
                assert_eq!(y, vec![3.0, 4.0]);
                assert_eq!(mode, "markers");
                assert_eq!(marker, Some(MarkerStyle { size: 8 }));
            }
            other => panic!("expected point series, got {other:?}"),
        }
    }

    #[test]
    fn test_line_mode_and_labels() {
        let payload = json!({
            "x": [0, 1, 2],
            "y": [0, 1, 4],
            "title": "Loss Curve",
            "xlabel": "Epoch",
            "ylabel": "Loss"
        });
        let chart = chart_descriptor(ChartKind::Line, &payload);

        assert_eq!(chart.layout.title, "Loss Curve");
        assert_eq!(chart.layout.x_label, "Epoch");
        assert_eq!(chart.layout.y_label, "Loss");
        match chart.series {
            Series::Points { mode, line, marker, .. } => {
                assert_eq!(mode, "lines");
                assert_eq!(line, Some(LineStyle { width: 2 }));
                assert_eq!(marker, None);
            }
            other => panic!("expected point series, got {other:?}"),
        }
    }

    #[test]
    fn test_heatmap_wraps_matrix() {
        let payload = json!({ "matrix": [[5, 1], [2, 7]] });
        let chart = chart_descriptor(ChartKind::Heatmap, &payload);

        assert_eq!(chart.layout.title, "Confusion Matrix");
        assert_eq!(chart.layout.x_label, "Predicted");
        assert_eq!(chart.layout.y_label, "Actual");
        match chart.series {
            Series::Grid {
                z,
                colorscale,
                showscale,
            } => {
                assert_eq!(z, vec![vec![5.0, 1.0], vec![2.0, 7.0]]);
                assert_eq!(colorscale, "Blues");
                assert!(showscale);
            }
            other => panic!("expected grid series, got {other:?}"),
        }
    }

    #[test]
    fn test_heatmap_default_matrix() {
        let chart = chart_descriptor(ChartKind::Heatmap, &json!({}));
        match chart.series {
            Series::Grid { z, .. } => assert_eq!(z, vec![vec![0.0]]),
            other => panic!("expected grid series, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_malformed_fields_resolve_to_defaults() {
        let payload = json!({ "x": "not an array", "y": [1, "two", 3] });
        let chart = chart_descriptor(ChartKind::Scatter, &payload);
        match chart.series {
            Series::Points { x, y, .. } => {
                assert!(x.is_empty());
                // Non-numeric entries are skipped.
                assert_eq!(y, vec![1.0, 3.0]);
            }
            other => panic!("expected point series, got {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_for_rejects_unknown_kind() {
        let err = chart_descriptor_for("sankey", &json!({})).unwrap_err();
        assert_eq!(err, ChartError::UnsupportedKind("sankey".to_string()));
    }

    #[test]
    fn test_layout_serializes_camel_case() {
        let chart = chart_descriptor(ChartKind::Scatter, &json!({}));
        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["layout"]["xLabel"], "X");
        assert_eq!(value["layout"]["yLabel"], "Y");
        assert_eq!(value["kind"], "scatter");
        assert_eq!(value["series"]["mode"], "markers");
    }
}
