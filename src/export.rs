//! Flat CSV export and tolerant re-import of trial records.
//!
//! One row per trial. The full layout appends the closed-form range and
//! the sampled trajectory as a JSON array of `[x, y, z]` triples.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::theoretical_distance;
use crate::error::Result;
use crate::params::LaunchParams;
use crate::trajectory_sampling::Trajectory;
use crate::trial::{FlightOutcome, Trial, TrialId, TrialOrigin, TrialResult, TrialStore};

const BASIC_HEADER: [&str; 6] = ["Velocity", "Angle", "Spin", "Distance", "MaxHeight", "AirTime"];
const FULL_EXTRA_HEADER: [&str; 2] = ["TheoreticalDistance", "Trajectory"];

/// Which columns an export carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportColumns {
    /// The six numeric columns
    Basic,
    /// Numeric columns plus theoretical distance and trajectory
    #[default]
    Full,
}

/// Write trials as CSV to any writer
pub fn write_trials<W: Write>(writer: W, trials: &[Trial], columns: ExportColumns) -> Result<()> {
    let mut csv = WriterBuilder::new().from_writer(writer);

    let mut header: Vec<&str> = BASIC_HEADER.to_vec();
    if columns == ExportColumns::Full {
        header.extend(FULL_EXTRA_HEADER);
    }
    csv.write_record(&header)?;

    for trial in trials {
        let mut row = vec![
            trial.params.launch_velocity.to_string(),
            trial.params.angle_deg.to_string(),
            trial.params.spin.to_string(),
            trial.results.distance.to_string(),
            trial.results.max_height.to_string(),
            trial.results.air_time.to_string(),
        ];
        if columns == ExportColumns::Full {
            row.push(theoretical_distance(&trial.params).to_string());
            row.push(serde_json::to_string(&trial.results.trajectory)?);
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write trials to a CSV file, replacing it if present
pub fn export_csv<P: AsRef<Path>>(path: P, trials: &[Trial], columns: ExportColumns) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_trials(file, trials, columns)?;
    debug!(path = %path.as_ref().display(), rows = trials.len(), "exported trials");
    Ok(())
}

/// A row left out of an import, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the file, header included
    pub line: u64,
    pub reason: String,
}

/// Outcome of reading a CSV into a store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub imported: Vec<TrialId>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Velocity,
    Angle,
    Spin,
    Distance,
    MaxHeight,
    AirTime,
    Trajectory,
}

impl Column {
    /// Header lookup ignoring case and spaces, so `Max Height` matches `MaxHeight`
    fn from_header(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "velocity" | "launchvelocity" => Some(Column::Velocity),
            "angle" => Some(Column::Angle),
            "spin" => Some(Column::Spin),
            "distance" => Some(Column::Distance),
            "maxheight" => Some(Column::MaxHeight),
            "airtime" => Some(Column::AirTime),
            "trajectory" => Some(Column::Trajectory),
            _ => None,
        }
    }
}

struct Layout {
    columns: Vec<Option<Column>>,
}

impl Layout {
    fn new(header: &StringRecord) -> Self {
        Self {
            columns: header.iter().map(Column::from_header).collect(),
        }
    }

    fn get<'r>(&self, record: &'r StringRecord, column: Column) -> Option<&'r str> {
        let idx = self.columns.iter().position(|c| *c == Some(column))?;
        record.get(idx).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Numeric field, 0 when absent, empty or unparsable
    fn number(&self, record: &StringRecord, column: Column) -> f64 {
        self.get(record, column)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

fn parse_row(layout: &Layout, record: &StringRecord) -> std::result::Result<(LaunchParams, TrialResult), String> {
    let velocity = layout
        .get(record, Column::Velocity)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| "velocity is not a finite number".to_string())?;

    let trajectory = match layout.get(record, Column::Trajectory) {
        Some(blob) => serde_json::from_str::<Trajectory>(blob)
            .map_err(|e| format!("trajectory is not valid JSON: {e}"))?,
        None => Trajectory::default(),
    };

    let params = LaunchParams {
        launch_velocity: velocity,
        angle_deg: layout.number(record, Column::Angle),
        spin: layout.number(record, Column::Spin),
        ..Default::default()
    };
    let results = TrialResult {
        distance: layout.number(record, Column::Distance),
        max_height: layout.number(record, Column::MaxHeight),
        air_time: layout.number(record, Column::AirTime),
        trajectory,
        outcome: FlightOutcome::Landed,
    };
    Ok((params, results))
}

/// Append every usable CSV row to `store` as an imported trial
///
/// Rows are skipped, never fatal: a row with a non-finite velocity, an
/// undecodable trajectory or a broken record is listed in the report.
///
/// Only velocity, angle and spin come from the file; mass, drag, gravity
/// and air density take [`LaunchParams::default`]. The `TheoreticalDistance`
/// column is not read back: it is recomputed from the imported params
/// whenever it is needed, so it follows the default gravity rather than
/// the exported value.
pub fn read_trials<R: Read>(reader: R, store: &mut TrialStore) -> Result<ImportReport> {
    let mut csv = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);
    let layout = Layout::new(csv.headers()?);

    let mut report = ImportReport::default();
    for (idx, record) in csv.records().enumerate() {
        let line = record
            .as_ref()
            .ok()
            .and_then(|r| r.position())
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);

        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|r| parse_row(&layout, &r));

        match parsed {
            Ok((params, results)) => {
                report.imported.push(store.record(params, results, TrialOrigin::Imported));
            }
            Err(reason) => {
                warn!(line, %reason, "skipping CSV row");
                report.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    Ok(report)
}

/// Import trials from a CSV file into `store`
pub fn import_csv<P: AsRef<Path>>(path: P, store: &mut TrialStore) -> Result<ImportReport> {
    let file = File::open(path.as_ref())?;
    let report = read_trials(file, store)?;
    debug!(
        path = %path.as_ref().display(),
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        "imported trials"
    );
    Ok(report)
}
