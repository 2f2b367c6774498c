//! Chart series model and chart collaborator contract.
//!
//! A [`Series`] is an ordered, named collection of 2D points destined for
//! chart rendering. Workers own their series through a [`SharedSeries`]
//! handle; attaching it to a [`Chart`] shares it with the chart for the
//! worker's lifetime, and detaching never destroys the point data.
//!
//! [`ChartModel`] is the headless chart implementation the GUI wraps: it
//! tracks attached series and computes default axis ranges from their
//! points. Rendering is out of scope.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

/// Ordered, named collection of points.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    points: Vec<SeriesPoint>,
}

impl Series {
    /// Create an empty series with a display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Create an empty series behind a shared handle.
    pub fn new_shared(name: impl Into<String>) -> SharedSeries {
        Arc::new(Mutex::new(Self::new(name)))
    }

    /// Display name of the series.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a point. Insertion order is preserved.
    pub fn push(&mut self, x: f64, y: f64) {
        self.points.push(SeriesPoint { x, y });
    }

    /// All points in insertion order.
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Write the series in the persisted text format.
    ///
    /// First line is the series name, then one line per point as
    /// `"<x, 0 decimals>, <y, 9 decimals>"`. Consumers parse by splitting
    /// each line on `", "`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.name)?;
        for point in &self.points {
            writeln!(out, "{:.0}, {:.9}", point.x, point.y)?;
        }
        Ok(())
    }
}

/// Shared handle to a series.
///
/// Written only by the owning worker thread during a run; read by the chart
/// thread after completion has been observed. The lock makes any other
/// interleaving safe rather than undefined.
pub type SharedSeries = Arc<Mutex<Series>>;

/// Chart collaborator contract.
///
/// Series identity is by handle (`Arc::ptr_eq`), not by name: two series may
/// carry the same display name.
pub trait Chart: Send + Sync {
    /// Attach a series for display.
    fn add_series(&self, series: &SharedSeries);

    /// Detach a series without destroying it.
    fn remove_series(&self, series: &SharedSeries);

    /// Recompute default axis ranges from the attached series.
    fn create_default_axes(&self);
}

/// Default axis ranges computed from attached series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRanges {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// In-memory chart model.
#[derive(Default)]
pub struct ChartModel {
    attached: Mutex<Vec<SharedSeries>>,
    axes: Mutex<Option<AxisRanges>>,
}

impl ChartModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently attached series.
    pub fn attached_count(&self) -> usize {
        self.attached.lock().len()
    }

    /// Check whether a series handle is attached.
    pub fn contains(&self, series: &SharedSeries) -> bool {
        self.attached.lock().iter().any(|s| Arc::ptr_eq(s, series))
    }

    /// Axis ranges from the last `create_default_axes` call.
    ///
    /// `None` until axes have been computed, or when no attached series has
    /// any points.
    pub fn axes(&self) -> Option<AxisRanges> {
        *self.axes.lock()
    }
}

impl Chart for ChartModel {
    fn add_series(&self, series: &SharedSeries) {
        let mut attached = self.attached.lock();
        if !attached.iter().any(|s| Arc::ptr_eq(s, series)) {
            attached.push(Arc::clone(series));
        }
    }

    fn remove_series(&self, series: &SharedSeries) {
        self.attached.lock().retain(|s| !Arc::ptr_eq(s, series));
    }

    fn create_default_axes(&self) {
        let attached = self.attached.lock();
        let mut ranges: Option<AxisRanges> = None;

        for series in attached.iter() {
            let series = series.lock();
            for point in series.points() {
                ranges = Some(match ranges {
                    None => AxisRanges {
                        x_min: point.x,
                        x_max: point.x,
                        y_min: point.y,
                        y_max: point.y,
                    },
                    Some(r) => AxisRanges {
                        x_min: r.x_min.min(point.x),
                        x_max: r.x_max.max(point.x),
                        y_min: r.y_min.min(point.y),
                        y_max: r.y_max.max(point.y),
                    },
                });
            }
        }

        *self.axes.lock() = ranges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_preserves_insertion_order() {
        let mut series = Series::new("Pcr");
        series.push(2.0, 0.5);
        series.push(1.0, 0.25);

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].x, 2.0);
        assert_eq!(series.points()[1].x, 1.0);
    }

    #[test]
    fn write_to_emits_name_then_points() {
        let mut series = Series::new("Jitter Pcr");
        series.push(12.0, 0.000001234);
        series.push(13.0, -1.5);

        let mut out = Vec::new();
        series.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Jitter Pcr");
        assert_eq!(lines[1], "12, 0.000001234");
        assert_eq!(lines[2], "13, -1.500000000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn chart_model_attach_detach() {
        let chart = ChartModel::new();
        let series = Series::new_shared("Pts");

        chart.add_series(&series);
        chart.add_series(&series); // attach is idempotent
        assert_eq!(chart.attached_count(), 1);
        assert!(chart.contains(&series));

        chart.remove_series(&series);
        assert_eq!(chart.attached_count(), 0);

        // Detach does not destroy the points
        series.lock().push(1.0, 2.0);
        assert_eq!(series.lock().len(), 1);
    }

    #[test]
    fn default_axes_span_all_attached_series() {
        let chart = ChartModel::new();

        let a = Series::new_shared("a");
        a.lock().push(0.0, -1.0);
        a.lock().push(10.0, 1.0);
        let b = Series::new_shared("b");
        b.lock().push(-5.0, 4.0);

        chart.add_series(&a);
        chart.add_series(&b);
        chart.create_default_axes();

        let axes = chart.axes().unwrap();
        assert_eq!(axes.x_min, -5.0);
        assert_eq!(axes.x_max, 10.0);
        assert_eq!(axes.y_min, -1.0);
        assert_eq!(axes.y_max, 4.0);
    }

    #[test]
    fn default_axes_none_without_points() {
        let chart = ChartModel::new();
        chart.add_series(&Series::new_shared("empty"));
        chart.create_default_axes();
        assert!(chart.axes().is_none());
    }
}
