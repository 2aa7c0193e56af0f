//! Chart payloads handed to the front end.

use popdyn_core::simulation::SimulationResult;
use popdyn_core::vector_field::VectorField;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

/// One line per state component against a shared time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub times: Vec<f64>,
    pub series: Vec<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ChartSeries {
    /// Components without a label are named `x0`, `x1`, ...
    pub fn from_result<L: AsRef<str>>(result: &SimulationResult, labels: &[L]) -> Self {
        let series = (0..result.dimension())
            .map(|k| Series {
                label: labels
                    .get(k)
                    .map(|l| l.as_ref().to_string())
                    .unwrap_or_else(|| format!("x{k}")),
                values: result.component(k),
            })
            .collect();
        Self {
            times: result.times().to_vec(),
            series,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Arrow segments `[x, y, x + dx, y + dy]` plus the magnitude summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChart {
    pub segments: Vec<[f64; 4]>,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub summary: String,
}

impl FieldChart {
    pub fn from_field(field: &VectorField) -> Self {
        let segments = field
            .arrows()
            .map(|((x, y), (dx, dy))| [x, y, x + dx, y + dy])
            .collect();
        Self {
            segments,
            min_magnitude: field.min_magnitude,
            max_magnitude: field.max_magnitude,
            summary: format!(
                "Magnitude: min = {:.2}, max = {:.2}",
                field.min_magnitude, field.max_magnitude
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartSeries, FieldChart};
    use popdyn_core::simulation::{SimulationResult, TimeGrid};
    use popdyn_core::vector_field::{sample_fn, FieldGrid};

    #[test]
    fn one_series_per_component_with_fallback_names() {
        let grid = TimeGrid::new(0.0, 1.0, 2);
        let result = SimulationResult::constant(&[3.0, 2.0, 1.0], &grid);
        let chart = ChartSeries::from_result(&result, &["S", "I"]);
        assert_eq!(chart.times, vec![0.0, 0.5, 1.0]);
        let labels: Vec<_> = chart.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["S", "I", "x2"]);
        assert_eq!(chart.series[1].values, vec![2.0; 3]);
        assert!(chart.warning.is_none());
    }

    #[test]
    fn field_segments_start_at_grid_points() {
        let grid = FieldGrid {
            x_max: 1.0,
            y_max: 1.0,
            samples: 2,
        };
        let field = sample_fn(&grid, |x, _| (1.0, x)).expect("field");
        let chart = FieldChart::from_field(&field);
        assert_eq!(chart.segments.len(), 4);
        assert_eq!(chart.segments[0], [-1.0, -1.0, 0.0, -2.0]);
        assert_eq!(chart.summary, "Magnitude: min = 1.41, max = 1.41");
    }
}
