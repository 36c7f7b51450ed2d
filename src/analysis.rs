//! Aggregation over recorded trials: closed-form range, heatmap binning,
//! theoretical-vs-actual series and per-field summary statistics.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::REPORTED_PERCENTILES;
use crate::error::ProjectileError;
use crate::params::LaunchParams;
use crate::trial::{Trial, TrialId};

/// Flat-ground, drag-free range `v² · sin(2θ) / g`
///
/// Returns 0 when gravity is not positive or the result is not finite.
pub fn theoretical_distance(params: &LaunchParams) -> f64 {
    if !(params.gravity > 0.0) {
        return 0.0;
    }
    let v = params.launch_velocity;
    let distance = v * v * (2.0 * params.angle_rad()).sin() / params.gravity;
    if distance.is_finite() {
        distance
    } else {
        0.0
    }
}

/// Scalar quantity that can be read off a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TrialField {
    LaunchVelocity,
    Angle,
    Spin,
    Mass,
    Drag,
    Distance,
    MaxHeight,
    AirTime,
    TheoreticalDistance,
}

impl TrialField {
    pub const ALL: [TrialField; 9] = [
        TrialField::LaunchVelocity,
        TrialField::Angle,
        TrialField::Spin,
        TrialField::Mass,
        TrialField::Drag,
        TrialField::Distance,
        TrialField::MaxHeight,
        TrialField::AirTime,
        TrialField::TheoreticalDistance,
    ];

    pub fn extract(&self, trial: &Trial) -> f64 {
        match self {
            TrialField::LaunchVelocity => trial.params.launch_velocity,
            TrialField::Angle => trial.params.angle_deg,
            TrialField::Spin => trial.params.spin,
            TrialField::Mass => trial.params.mass,
            TrialField::Drag => trial.params.drag,
            TrialField::Distance => trial.results.distance,
            TrialField::MaxHeight => trial.results.max_height,
            TrialField::AirTime => trial.results.air_time,
            TrialField::TheoreticalDistance => theoretical_distance(&trial.params),
        }
    }

    /// Dotted path naming the field, e.g. `params.angle`
    pub fn path(&self) -> &'static str {
        match self {
            TrialField::LaunchVelocity => "params.launchVelocity",
            TrialField::Angle => "params.angle",
            TrialField::Spin => "params.spin",
            TrialField::Mass => "params.mass",
            TrialField::Drag => "params.drag",
            TrialField::Distance => "results.distance",
            TrialField::MaxHeight => "results.maxHeight",
            TrialField::AirTime => "results.airTime",
            TrialField::TheoreticalDistance => "results.theoreticalDistance",
        }
    }
}

impl fmt::Display for TrialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for TrialField {
    type Err = ProjectileError;

    /// Accepts dotted paths and bare names, ignoring case, `_`, `-` and spaces
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s
            .trim()
            .trim_start_matches("params.")
            .trim_start_matches("results.");
        let key: String = bare
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        let field = match key.as_str() {
            "launchvelocity" | "velocity" | "v" => TrialField::LaunchVelocity,
            "angle" | "angledeg" => TrialField::Angle,
            "spin" => TrialField::Spin,
            "mass" => TrialField::Mass,
            "drag" => TrialField::Drag,
            "distance" => TrialField::Distance,
            "maxheight" | "height" => TrialField::MaxHeight,
            "airtime" | "time" => TrialField::AirTime,
            "theoreticaldistance" | "theoretical" => TrialField::TheoreticalDistance,
            _ => return Err(ProjectileError::UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

/// One heatmap cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Mean of the z field over trials in the cell, `None` when empty
    pub value: Option<f64>,
    pub count: usize,
}

/// Fixed grid of bins over two trial fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub x_field: TrialField,
    pub y_field: TrialField,
    pub z_field: TrialField,
    x_bins: usize,
    y_bins: usize,
    cells: Vec<Bin>,
}

impl Heatmap {
    pub fn x_bins(&self) -> usize {
        self.x_bins
    }

    pub fn y_bins(&self) -> usize {
        self.y_bins
    }

    /// Cells ordered by x index, then y index
    pub fn cells(&self) -> &[Bin] {
        &self.cells
    }

    pub fn cell(&self, xi: usize, yi: usize) -> Option<&Bin> {
        if xi >= self.x_bins || yi >= self.y_bins {
            return None;
        }
        self.cells.get(xi * self.y_bins + yi)
    }

    pub fn occupied(&self) -> impl Iterator<Item = &Bin> {
        self.cells.iter().filter(|b| b.value.is_some())
    }
}

/// Extent of one axis; a zero or undefined span falls back to width 1
#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    span: f64,
    bins: usize,
}

impl Axis {
    fn over(values: impl Iterator<Item = f64>, bins: usize) -> Self {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let min = if min.is_finite() { min } else { 0.0 };
        let span = max - min;
        let span = if span.is_finite() && span > 0.0 { span } else { 1.0 };
        Self { min, span, bins }
    }

    fn index(&self, v: f64) -> usize {
        let raw = ((v - self.min) / self.span * self.bins as f64).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.bins - 1)
        }
    }

    fn range(&self, i: usize) -> (f64, f64) {
        let width = self.span / self.bins as f64;
        (self.min + width * i as f64, self.min + width * (i + 1) as f64)
    }
}

/// Average `z` over a uniform `x_bins × y_bins` grid spanning the x/y extents
///
/// Trials with a non-finite x, y or z take no part, neither in the
/// extents nor in the averages.
pub fn bin(
    trials: &[Trial],
    x: TrialField,
    y: TrialField,
    z: TrialField,
    x_bins: usize,
    y_bins: usize,
) -> Heatmap {
    let x_bins = x_bins.max(1);
    let y_bins = y_bins.max(1);

    let points: Vec<(f64, f64, f64)> = trials
        .iter()
        .map(|t| (x.extract(t), y.extract(t), z.extract(t)))
        .filter(|(a, b, c)| a.is_finite() && b.is_finite() && c.is_finite())
        .collect();

    let x_axis = Axis::over(points.iter().map(|p| p.0), x_bins);
    let y_axis = Axis::over(points.iter().map(|p| p.1), y_bins);

    let mut sums = vec![(0.0_f64, 0_usize); x_bins * y_bins];
    for &(px, py, pz) in &points {
        let slot = &mut sums[x_axis.index(px) * y_bins + y_axis.index(py)];
        slot.0 += pz;
        slot.1 += 1;
    }

    let cells = sums
        .iter()
        .enumerate()
        .map(|(i, &(sum, count))| Bin {
            x_range: x_axis.range(i / y_bins),
            y_range: y_axis.range(i % y_bins),
            value: (count > 0).then(|| sum / count as f64),
            count,
        })
        .collect();

    Heatmap {
        x_field: x,
        y_field: y,
        z_field: z,
        x_bins,
        y_bins,
        cells,
    }
}

/// Per-trial pairing of simulated and closed-form range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    pub trial_id: TrialId,
    pub launch_velocity: f64,
    pub angle: f64,
    pub actual: f64,
    pub theoretical: f64,
    pub max_height: f64,
    pub air_time: f64,
}

impl ComparisonPoint {
    /// actual / theoretical, `None` when the closed form gives 0
    pub fn ratio(&self) -> Option<f64> {
        (self.theoretical.abs() > 0.0).then(|| self.actual / self.theoretical)
    }
}

pub fn comparison_series(trials: &[Trial]) -> Vec<ComparisonPoint> {
    trials
        .iter()
        .map(|t| ComparisonPoint {
            trial_id: t.id,
            launch_velocity: t.params.launch_velocity,
            angle: t.params.angle_deg,
            actual: t.results.distance,
            theoretical: theoretical_distance(&t.params),
            max_height: t.results.max_height,
            air_time: t.results.air_time,
        })
        .collect()
}

/// Summary statistics for one field across trials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Vec<(f64, f64)>,  // (percentile, value) pairs
}

impl FieldStatistics {
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(q, _)| (q - p).abs() < 1e-12)
            .map(|&(_, v)| v)
    }
}

/// Statistics over the finite values of `field`; `None` when there are none
pub fn field_statistics(trials: &[Trial], field: TrialField) -> Option<FieldStatistics> {
    let mut values: Vec<f64> = trials
        .iter()
        .map(|t| field.extract(t))
        .filter(|v| v.is_finite())
        .collect();

    let (&first, _) = values.split_first()?;
    if values.len() == 1 {
        return Some(FieldStatistics {
            count: 1,
            mean: first,
            std: 0.0,
            min: first,
            max: first,
            percentiles: vec![(0.50, first)], // Only median makes sense
        });
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Some(FieldStatistics {
        count: values.len(),
        mean,
        std: variance.sqrt(),
        min: values[0],
        max: values[values.len() - 1],
        percentiles: REPORTED_PERCENTILES
            .iter()
            .map(|&p| (p, percentile(&values, p)))
            .collect(),
    })
}

/// Percentile of sorted values using linear interpolation
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let n = sorted_values.len();
    if n == 1 {
        return sorted_values[0];
    }

    let index = p * (n - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = index - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory_sampling::Trajectory;
    use crate::trial::{FlightOutcome, TrialOrigin, TrialResult, TrialStore};

    fn store_of(rows: &[(f64, f64, f64)]) -> TrialStore {
        // (velocity, angle, distance)
        let mut store = TrialStore::new();
        for &(launch_velocity, angle_deg, distance) in rows {
            store.record(
                LaunchParams { launch_velocity, angle_deg, ..Default::default() },
                TrialResult {
                    distance,
                    max_height: distance / 4.0,
                    air_time: 1.0,
                    trajectory: Trajectory::default(),
                    outcome: FlightOutcome::Landed,
                },
                TrialOrigin::Batch,
            );
        }
        store
    }

    #[test]
    fn test_theoretical_distance() {
        let params = LaunchParams { launch_velocity: 20.0, angle_deg: 45.0, gravity: 9.81, ..Default::default() };
        assert!((theoretical_distance(&params) - 40.7747).abs() < 1e-3);

        let flat = LaunchParams { angle_deg: 0.0, ..params };
        assert!(theoretical_distance(&flat).abs() < 1e-12);

        let no_gravity = LaunchParams { gravity: 0.0, ..params };
        assert_eq!(theoretical_distance(&no_gravity), 0.0);
        let nan = LaunchParams { launch_velocity: f64::NAN, ..params };
        assert_eq!(theoretical_distance(&nan), 0.0);
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("params.angle".parse::<TrialField>().unwrap(), TrialField::Angle);
        assert_eq!("angle".parse::<TrialField>().unwrap(), TrialField::Angle);
        assert_eq!("results.distance".parse::<TrialField>().unwrap(), TrialField::Distance);
        assert_eq!("params.launchVelocity".parse::<TrialField>().unwrap(), TrialField::LaunchVelocity);
        assert_eq!("max_height".parse::<TrialField>().unwrap(), TrialField::MaxHeight);
        assert_eq!("Air Time".parse::<TrialField>().unwrap(), TrialField::AirTime);
        assert!(matches!("colour".parse::<TrialField>(), Err(ProjectileError::UnknownField(_))));

        for field in TrialField::ALL {
            assert_eq!(field.path().parse::<TrialField>().unwrap(), field);
        }
    }

    #[test]
    fn test_bin_empty_store() {
        let heatmap = bin(&[], TrialField::LaunchVelocity, TrialField::Angle, TrialField::Distance, 12, 12);
        assert_eq!(heatmap.cells().len(), 144);
        assert!(heatmap.cells().iter().all(|b| b.value.is_none()));
    }

    #[test]
    fn test_bin_single_trial() {
        let store = store_of(&[(20.0, 45.0, 37.5)]);
        let heatmap = bin(store.trials(), TrialField::LaunchVelocity, TrialField::Angle, TrialField::Distance, 12, 12);
        let occupied: Vec<&Bin> = heatmap.occupied().collect();
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[0].value, Some(37.5));
        // zero-width extents fall back to width 1, so the trial lands in the first cell
        assert_eq!(heatmap.cell(0, 0).unwrap().value, Some(37.5));
    }

    #[test]
    fn test_bin_averages_and_clamps_max() {
        let store = store_of(&[
            (0.0, 0.0, 10.0),
            (0.0, 0.0, 20.0),
            (10.0, 10.0, 99.0),
        ]);
        let heatmap = bin(store.trials(), TrialField::LaunchVelocity, TrialField::Angle, TrialField::Distance, 4, 4);
        assert_eq!(heatmap.cell(0, 0).unwrap().value, Some(15.0));
        assert_eq!(heatmap.cell(0, 0).unwrap().count, 2);
        // the maximum maps to index `bins`, clamped into the last cell
        assert_eq!(heatmap.cell(3, 3).unwrap().value, Some(99.0));
        assert_eq!(heatmap.occupied().count(), 2);
        assert_eq!(heatmap.cell(3, 3).unwrap().x_range, (7.5, 10.0));
        assert!(heatmap.cell(4, 0).is_none());
    }

    #[test]
    fn test_bin_ignores_non_finite_values() {
        let store = store_of(&[(5.0, 30.0, f64::NAN), (6.0, 40.0, 12.0)]);
        let heatmap = bin(store.trials(), TrialField::LaunchVelocity, TrialField::Angle, TrialField::Distance, 3, 3);
        let total: usize = heatmap.cells().iter().map(|b| b.count).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_comparison_series() {
        let store = store_of(&[(20.0, 45.0, 35.0), (10.0, 0.0, 3.0)]);
        let series = comparison_series(store.trials());
        assert_eq!(series.len(), 2);
        assert!((series[0].theoretical - 40.7747).abs() < 1e-3);
        assert_eq!(series[0].actual, 35.0);
        assert!(series[0].ratio().unwrap() < 1.0);
        assert!(series[1].ratio().is_none());
    }

    #[test]
    fn test_percentile_calculation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 0.5), 3.0);
        assert_eq!(percentile(&values, 1.0), 5.0);
        assert_eq!(percentile(&values, 0.25), 2.0);
        assert_eq!(percentile(&values, 0.75), 4.0);
    }

    #[test]
    fn test_field_statistics() {
        let store = store_of(&[(1.0, 10.0, 2.0), (1.0, 10.0, 4.0), (1.0, 10.0, 6.0)]);
        let stats = field_statistics(store.trials(), TrialField::Distance).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.mean - 4.0).abs() < 1e-12);
        assert!((stats.std - 2.0).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert_eq!(stats.percentile(0.5), Some(4.0));

        assert!(field_statistics(&[], TrialField::Distance).is_none());
        let single = store_of(&[(1.0, 10.0, 7.0)]);
        let stats = field_statistics(single.trials(), TrialField::Distance).unwrap();
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.percentiles, vec![(0.5, 7.0)]);
    }
}
