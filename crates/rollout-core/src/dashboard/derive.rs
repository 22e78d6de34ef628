//! Values derived from a snapshot for display.

use std::collections::BTreeMap;

use crate::types::{MetricsSummary, StatusFilter};

/// A value out of a total, rendered as a donut or progress gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gauge {
    pub label: &'static str,
    pub value: u32,
    pub total: u32,
    /// Filter to open the deployments view with when the gauge is selected.
    pub drill_down: Option<StatusFilter>,
}

impl Gauge {
    /// Fraction in `0.0..=1.0`; zero when the total is zero.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (f64::from(self.value) / f64::from(self.total)).min(1.0)
    }
}

/// Successful tasks, failed tasks and scan coverage.
pub fn gauges(metrics: &MetricsSummary) -> [Gauge; 3] {
    [
        Gauge {
            label: "Successful tasks",
            value: metrics.success_tasks,
            total: metrics.total_tasks,
            drill_down: Some(StatusFilter::Success),
        },
        Gauge {
            label: "Failed tasks",
            value: metrics.failed_tasks,
            total: metrics.total_tasks,
            drill_down: Some(StatusFilter::Failed),
        },
        Gauge {
            label: "Coverage",
            value: metrics.targets_scanned,
            total: metrics.targets_total,
            drill_down: None,
        },
    ]
}

/// One bar of a histogram chart.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u32,
    /// Bar length relative to the largest value, in `0.0..=1.0`.
    pub width: f64,
}

/// Turn a histogram into chart rows; an empty histogram yields one
/// zero-valued placeholder row.
pub fn series(histogram: &BTreeMap<String, u32>, placeholder: &str) -> Vec<SeriesPoint> {
    if histogram.is_empty() {
        return vec![SeriesPoint {
            label: placeholder.to_string(),
            value: 0,
            width: 0.0,
        }];
    }

    let max = histogram.values().copied().max().unwrap_or(0).max(1);
    histogram
        .iter()
        .map(|(label, value)| SeriesPoint {
            label: label.clone(),
            value: *value,
            width: f64::from(*value) / f64::from(max),
        })
        .collect()
}

pub fn failure_reasons(metrics: &MetricsSummary) -> Vec<SeriesPoint> {
    series(&metrics.failure_reasons, "No failures")
}

pub fn success_by_os(metrics: &MetricsSummary) -> Vec<SeriesPoint> {
    series(&metrics.success_by_os, "No data")
}

pub fn failure_by_os(metrics: &MetricsSummary) -> Vec<SeriesPoint> {
    series(&metrics.failure_by_os, "No data")
}

pub fn auth_methods(metrics: &MetricsSummary) -> Vec<SeriesPoint> {
    series(&metrics.auth_methods, "No data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn gauge_ratio_is_clamped_and_zero_safe() {
        let gauge = Gauge {
            label: "x",
            value: 5,
            total: 0,
            drill_down: None,
        };
        assert_eq!(gauge.ratio(), 0.0);

        let over = Gauge {
            value: 12,
            total: 10,
            ..gauge
        };
        assert_eq!(over.ratio(), 1.0);
    }

    #[test]
    fn demo_gauges() {
        let [success, failed, coverage] = gauges(&demo::metrics());
        assert_eq!((success.value, success.total), (13, 18));
        assert_eq!(failed.drill_down, Some(StatusFilter::Failed));
        assert_eq!((coverage.value, coverage.total), (198, 220));
        assert_eq!(coverage.drill_down, None);
    }

    #[test]
    fn empty_histogram_has_placeholder() {
        let metrics = MetricsSummary::default();
        let rows = failure_reasons(&metrics);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "No failures");
        assert_eq!(auth_methods(&metrics)[0].label, "No data");
    }

    #[test]
    fn widths_are_relative_to_largest() {
        let rows = success_by_os(&demo::metrics());
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["linux", "macos", "windows"]);
        assert_eq!(rows[0].width, 1.0);
        assert_eq!(rows[2].width, 0.5);
    }

    #[test]
    fn all_zero_histogram_has_zero_widths() {
        let mut histogram = BTreeMap::new();
        histogram.insert("linux".to_string(), 0);
        let rows = series(&histogram, "No data");
        assert_eq!(rows[0].width, 0.0);
    }
}
