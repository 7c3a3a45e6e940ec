//! Chart handoff for the plotting collaborator.
//!
//! Rendering is not done here. A [`PlotRequest`] packages everything a
//! renderer needs from an [`EffectSizeResult`]: the chosen style, titles,
//! axis labels, and chart-ready data derived from the cleaned subset.
//!
//! | Analysis | Styles | Data |
//! |----------|--------|------|
//! | categorical × categorical | Stacked Bar Chart, Grouped Bar Chart, Heatmap | contingency counts |
//! | categorical × numeric | Box Plot, Violin Plot, Strip Plot | per-group values + five-number summary |
//! | numeric × numeric | Scatter Plot, Hexbin Plot, Regression Plot | points + optional regression line |

use std::fmt;
use std::str::FromStr;

use crate::association::ContingencyTable;
use crate::cleaning::AnalysisKind;
use crate::correlation::RegressionLine;
use crate::error::EffectError;
use crate::result::{AnalysisDetails, EffectSizeResult};

/// Chart style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotStyle {
    StackedBarChart,
    GroupedBarChart,
    Heatmap,
    BoxPlot,
    ViolinPlot,
    StripPlot,
    ScatterPlot,
    HexbinPlot,
    RegressionPlot,
}

impl PlotStyle {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::StackedBarChart => "Stacked Bar Chart",
            Self::GroupedBarChart => "Grouped Bar Chart",
            Self::Heatmap => "Heatmap",
            Self::BoxPlot => "Box Plot",
            Self::ViolinPlot => "Violin Plot",
            Self::StripPlot => "Strip Plot",
            Self::ScatterPlot => "Scatter Plot",
            Self::HexbinPlot => "Hexbin Plot",
            Self::RegressionPlot => "Regression Plot",
        }
    }

    /// Styles offered for an analysis kind, default first.
    pub fn for_analysis(kind: AnalysisKind) -> &'static [PlotStyle] {
        match kind {
            AnalysisKind::CategoricalCategorical => {
                &[Self::StackedBarChart, Self::GroupedBarChart, Self::Heatmap]
            }
            AnalysisKind::CategoricalNumeric => &[Self::BoxPlot, Self::ViolinPlot, Self::StripPlot],
            AnalysisKind::NumericNumeric => {
                &[Self::ScatterPlot, Self::HexbinPlot, Self::RegressionPlot]
            }
        }
    }

    /// Analysis kind this style belongs to.
    pub fn analysis(self) -> AnalysisKind {
        match self {
            Self::StackedBarChart | Self::GroupedBarChart | Self::Heatmap => {
                AnalysisKind::CategoricalCategorical
            }
            Self::BoxPlot | Self::ViolinPlot | Self::StripPlot => AnalysisKind::CategoricalNumeric,
            Self::ScatterPlot | Self::HexbinPlot | Self::RegressionPlot => {
                AnalysisKind::NumericNumeric
            }
        }
    }
}

impl fmt::Display for PlotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlotStyle {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisKind::ALL
            .iter()
            .flat_map(|&k| Self::for_analysis(k).iter().copied())
            .find(|style| style.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EffectError::InvalidPlotStyle {
                style: s.to_string(),
                reason: "unknown plot style".to_string(),
            })
    }
}

/// Five-number summary for box plots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl BoxSummary {
    /// Computes the summary, or `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            min: u_numflow::stats::min(values)?,
            q1: u_numflow::stats::quantile(values, 0.25)?,
            median: u_numflow::stats::median(values)?,
            q3: u_numflow::stats::quantile(values, 0.75)?,
            max: u_numflow::stats::max(values)?,
        })
    }
}

/// Values of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSeries {
    pub label: String,
    pub values: Vec<f64>,
    pub summary: Option<BoxSummary>,
}

/// Chart-ready data.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotData {
    /// Cross-tabulated counts (bars or heatmap cells).
    Counts(ContingencyTable),
    /// Numeric values per category.
    Groups(Vec<GroupSeries>),
    /// Paired points, with a fitted line when it should be drawn.
    Points {
        x: Vec<f64>,
        y: Vec<f64>,
        regression: Option<RegressionLine>,
    },
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub style: PlotStyle,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: PlotData,
}

impl PlotRequest {
    /// Builds a chart request from an analysis result.
    ///
    /// `overlay_regression` only applies to [`PlotStyle::ScatterPlot`]; the
    /// Regression Plot always carries its line.
    ///
    /// # Errors
    ///
    /// [`EffectError::InvalidPlotStyle`] when `style` does not belong to the
    /// result's analysis kind, or an overlay is requested on another style.
    pub fn new(
        result: &EffectSizeResult,
        style: PlotStyle,
        overlay_regression: bool,
    ) -> Result<Self, EffectError> {
        if style.analysis() != result.analysis {
            return Err(EffectError::InvalidPlotStyle {
                style: style.name().to_string(),
                reason: format!("not offered for '{}'", result.analysis),
            });
        }
        if overlay_regression && style != PlotStyle::ScatterPlot {
            return Err(EffectError::InvalidPlotStyle {
                style: style.name().to_string(),
                reason: "regression overlay is only available on the Scatter Plot".to_string(),
            });
        }

        let (a, b) = (&result.columns.0, &result.columns.1);
        let (title, y_label) = match result.analysis {
            AnalysisKind::CategoricalCategorical => (
                format!("{a} vs {b}"),
                if style == PlotStyle::Heatmap {
                    b.clone()
                } else {
                    "Count".to_string()
                },
            ),
            AnalysisKind::CategoricalNumeric => (format!("{style} of {b} by {a}"), b.clone()),
            AnalysisKind::NumericNumeric => (format!("{style} of {a} vs {b}"), b.clone()),
        };

        Ok(Self {
            style,
            title,
            x_label: a.clone(),
            y_label,
            data: plot_data(result, style, overlay_regression)?,
        })
    }
}

fn plot_data(
    result: &EffectSizeResult,
    style: PlotStyle,
    overlay_regression: bool,
) -> Result<PlotData, EffectError> {
    let cleaned = &result.cleaned;
    let missing_column = |name: &str| EffectError::InvalidColumnSelection {
        reason: format!("column '{name}' missing from cleaned data"),
    };
    let (a, b) = (result.columns.0.as_str(), result.columns.1.as_str());

    match &result.details {
        AnalysisDetails::Association { contingency, .. } => {
            Ok(PlotData::Counts(contingency.clone()))
        }
        AnalysisDetails::TwoGroups { .. } | AnalysisDetails::MultiGroup { .. } => {
            let cat = cleaned.column_by_name(a).ok_or_else(|| missing_column(a))?;
            let num = cleaned.column_by_name(b).ok_or_else(|| missing_column(b))?;
            let mut series: Vec<GroupSeries> = Vec::new();
            for i in 0..cleaned.row_count() {
                let (Some(label), Some(value)) = (cat.label_at(i), num.coerce_numeric_at(i)) else {
                    continue;
                };
                match series.iter_mut().find(|s| s.label == label) {
                    Some(s) => s.values.push(value),
                    None => series.push(GroupSeries {
                        label,
                        values: vec![value],
                        summary: None,
                    }),
                }
            }
            for s in &mut series {
                s.summary = BoxSummary::from_values(&s.values);
            }
            Ok(PlotData::Groups(series))
        }
        AnalysisDetails::Correlation { regression, .. } => {
            let x = cleaned
                .column_by_name(a)
                .and_then(|c| c.as_numeric())
                .ok_or_else(|| missing_column(a))?;
            let y = cleaned
                .column_by_name(b)
                .and_then(|c| c.as_numeric())
                .ok_or_else(|| missing_column(b))?;
            let draw_line = match style {
                PlotStyle::RegressionPlot => true,
                PlotStyle::ScatterPlot => overlay_regression,
                _ => false,
            };
            Ok(PlotData::Points {
                x: x.to_vec(),
                y: y.to_vec(),
                regression: if draw_line { *regression } else { None },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::{Column, Table};
    use crate::engine::{analyze, AnalysisConfig};

    fn table() -> Table {
        let group: Vec<Option<&str>> = (0..8).map(|i| Some(if i < 4 { "A" } else { "B" })).collect();
        let flag: Vec<Option<&str>> = (0..8).map(|i| Some(if i % 3 == 0 { "on" } else { "off" })).collect();
        let x: Vec<Option<f64>> = (0..8).map(|i| Some(i as f64)).collect();
        let y: Vec<Option<f64>> = [1.0, 3.0, 2.0, 5.0, 4.0, 6.0, 8.0, 7.0].map(Some).to_vec();
        Table::from_columns([
            ("group".to_string(), Column::categorical_from_labels(&group)),
            ("flag".to_string(), Column::categorical_from_labels(&flag)),
            ("x".to_string(), Column::numeric_from_options(&x)),
            ("y".to_string(), Column::numeric_from_options(&y)),
        ])
        .unwrap()
    }

    fn run(a: &str, b: &str, kind: AnalysisKind) -> EffectSizeResult {
        analyze(&table(), a, b, kind, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn styles_are_scoped_per_analysis() {
        for kind in AnalysisKind::ALL {
            let styles = PlotStyle::for_analysis(kind);
            assert_eq!(styles.len(), 3);
            assert!(styles.iter().all(|s| s.analysis() == kind));
        }
        assert_eq!("heatmap".parse::<PlotStyle>().unwrap(), PlotStyle::Heatmap);
        assert_eq!("Box Plot".parse::<PlotStyle>().unwrap(), PlotStyle::BoxPlot);
        assert!("Pie Chart".parse::<PlotStyle>().is_err());
    }

    #[test]
    fn counts_for_categorical_pair() {
        let result = run("group", "flag", AnalysisKind::CategoricalCategorical);
        let request = PlotRequest::new(&result, PlotStyle::StackedBarChart, false).unwrap();
        assert_eq!(request.title, "group vs flag");
        assert_eq!(request.y_label, "Count");
        match request.data {
            PlotData::Counts(ct) => assert_eq!(ct.total(), 8),
            other => panic!("unexpected data: {other:?}"),
        }

        let heatmap = PlotRequest::new(&result, PlotStyle::Heatmap, false).unwrap();
        assert_eq!(heatmap.y_label, "flag");
    }

    #[test]
    fn groups_for_box_plot() {
        let result = run("group", "y", AnalysisKind::CategoricalNumeric);
        let request = PlotRequest::new(&result, PlotStyle::BoxPlot, false).unwrap();
        assert_eq!(request.title, "Box Plot of y by group");
        assert_eq!(request.x_label, "group");
        match request.data {
            PlotData::Groups(series) => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].label, "A");
                assert_eq!(series[0].values, vec![1.0, 3.0, 2.0, 5.0]);
                let summary = series[0].summary.expect("summary");
                assert_eq!(summary.min, 1.0);
                assert_eq!(summary.max, 5.0);
            }
            other => panic!("unexpected data: {other:?}"),
        }
    }

    #[test]
    fn regression_line_only_when_requested() {
        let result = run("x", "y", AnalysisKind::NumericNumeric);

        let plain = PlotRequest::new(&result, PlotStyle::ScatterPlot, false).unwrap();
        let overlay = PlotRequest::new(&result, PlotStyle::ScatterPlot, true).unwrap();
        let regplot = PlotRequest::new(&result, PlotStyle::RegressionPlot, false).unwrap();
        let hexbin = PlotRequest::new(&result, PlotStyle::HexbinPlot, false).unwrap();

        let line = |req: &PlotRequest| match &req.data {
            PlotData::Points { regression, .. } => *regression,
            other => panic!("unexpected data: {other:?}"),
        };
        assert!(line(&plain).is_none());
        assert!(line(&overlay).is_some());
        assert!(line(&regplot).is_some());
        assert!(line(&hexbin).is_none());
        assert_eq!(overlay.title, "Scatter Plot of x vs y");
    }

    #[test]
    fn mismatched_style_rejected() {
        let result = run("x", "y", AnalysisKind::NumericNumeric);
        let err = PlotRequest::new(&result, PlotStyle::Heatmap, false).unwrap_err();
        assert!(matches!(err, EffectError::InvalidPlotStyle { .. }));

        let err = PlotRequest::new(&result, PlotStyle::HexbinPlot, true).unwrap_err();
        assert!(matches!(err, EffectError::InvalidPlotStyle { .. }));
    }
}
