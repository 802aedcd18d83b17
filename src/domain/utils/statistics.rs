use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::graph::graph::Dag;
use crate::domain::system::system::System;
use crate::domain::system::transmission::Transmission;
use crate::error::Result;

/// Quality figures of a finished schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMetrics {
    /// Latest calculation end over all units.
    pub makespan: i64,

    /// Sum of all task weights, the duration on a single unit.
    pub serial_duration: i64,

    /// `serial_duration / makespan`, zero for an empty schedule.
    pub speed_up: f64,

    /// `speed_up / unit_count`.
    pub efficiency: f64,

    pub unit_count: usize,
}

impl ScheduleMetrics {
    pub fn new(dag: &Dag, system: &System) -> Self {
        let makespan = system.duration();
        let serial_duration = dag.duration_on_one_cpu();
        let unit_count = system.unit_count();

        let speed_up = if makespan > 0 { serial_duration as f64 / makespan as f64 } else { 0.0 };
        let efficiency = if unit_count > 0 { speed_up / unit_count as f64 } else { 0.0 };

        Self { makespan, serial_duration, speed_up, efficiency, unit_count }
    }
}

/// What a timeline row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntervalKind {
    Calc,
    Transfer,
}

/// One occupied interval of a unit, as written to the Gantt CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimelineRow {
    pub unit: String,
    pub kind: IntervalKind,

    /// Link index for transfers, empty for calculations.
    pub link: Option<usize>,
    pub start: i64,
    pub end: i64,

    /// The running task, or `source->target` for a transfer.
    pub label: String,

    /// `in` or `out` for transfers.
    pub direction: Option<String>,
    pub peer: Option<String>,
}

/// Every calculation and transfer segment of `system`, per unit in id order, sorted by start.
pub fn timeline_rows(system: &System) -> Vec<TimelineRow> {
    let mut rows = Vec::new();

    for unit in system.units() {
        let mut unit_rows: Vec<TimelineRow> = unit
            .timeline()
            .into_iter()
            .map(|calc| TimelineRow {
                unit: unit.id.to_string(),
                kind: IntervalKind::Calc,
                link: None,
                start: calc.start,
                end: calc.end,
                label: calc.task.to_string(),
                direction: None,
                peer: None,
            })
            .collect();

        for link in unit.links() {
            for segment in link.segments() {
                let label = match system.transmission(segment.transmission) {
                    Some(transmission) => transfer_label(transmission),
                    None => String::from("?"),
                };
                unit_rows.push(TimelineRow {
                    unit: unit.id.to_string(),
                    kind: IntervalKind::Transfer,
                    link: Some(link.index),
                    start: segment.start,
                    end: segment.end,
                    label,
                    direction: Some(segment.direction.to_string()),
                    peer: Some(segment.peer.to_string()),
                });
            }
        }

        unit_rows.sort_by(|a, b| (a.start, a.link, &a.label).cmp(&(b.start, b.link, &b.label)));
        rows.extend(unit_rows);
    }

    rows
}

fn transfer_label(transmission: &Transmission) -> String {
    format!("{}->{}", transmission.source_task(), transmission.target_task())
}

/// Writes the timeline of `system` as `;` separated CSV with a header row.
pub fn write_timeline<W: Write>(system: &System, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    for row in timeline_rows(system) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_timeline_file(system: &System, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_timeline(system, file)?;

    log::info!("Wrote schedule timeline to '{}'.", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::graph::Topology;
    use crate::domain::utils::id::NodeId;

    fn id(value: &str) -> NodeId {
        NodeId::new(value)
    }

    fn placed_system() -> (Dag, System) {
        let mut dag = Dag::new();
        dag.add_node(0.0, 0.0, 2, Some(id("A"))).unwrap();
        dag.add_node(0.0, 0.0, 2, Some(id("B"))).unwrap();
        dag.add_edge("A", "B", 1).unwrap();

        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 1, Some(id("X"))).unwrap();
        topology.add_node(0.0, 0.0, 1, Some(id("Y"))).unwrap();
        topology.add_edge("X", "Y", 1).unwrap();

        let mut system = System::new(&topology, false, true);
        system.schedule_calculation(&id("A"), 0, 2, &id("X")).unwrap();
        system.schedule_transmission(&[(id("X"), id("Y"))], &id("Y"), 2, &id("A"), &id("B"), 1).unwrap();
        system.schedule_calculation(&id("B"), 3, 2, &id("Y")).unwrap();
        (dag, system)
    }

    #[test]
    fn metrics_relate_makespan_to_serial_duration() {
        let (dag, system) = placed_system();

        let metrics = ScheduleMetrics::new(&dag, &system);

        assert_eq!(metrics.makespan, 5);
        assert_eq!(metrics.serial_duration, 4);
        assert!((metrics.speed_up - 0.8).abs() < 1e-9);
        assert!((metrics.efficiency - 0.4).abs() < 1e-9);
    }

    #[test]
    fn empty_schedule_has_zero_speed_up() {
        let topology = Topology::new();
        let metrics = ScheduleMetrics::new(&Dag::new(), &System::new(&topology, false, true));

        assert_eq!(metrics.speed_up, 0.0);
        assert_eq!(metrics.efficiency, 0.0);
    }

    #[test]
    fn timeline_lists_calculations_and_segments() {
        let (_, system) = placed_system();

        let rows = timeline_rows(&system);

        assert_eq!(rows.len(), 4);
        assert_eq!((rows[0].unit.as_str(), rows[0].kind, rows[0].label.as_str()), ("X", IntervalKind::Calc, "A"));
        assert_eq!((rows[1].kind, rows[1].start, rows[1].direction.as_deref()), (IntervalKind::Transfer, 2, Some("out")));
        assert_eq!(rows[1].label, "A->B");
        assert_eq!((rows[2].unit.as_str(), rows[2].direction.as_deref()), ("Y", Some("in")));
        assert_eq!((rows[3].kind, rows[3].start, rows[3].end), (IntervalKind::Calc, 3, 5));
    }

    #[test]
    fn timeline_csv_has_header_and_rows() {
        let (_, system) = placed_system();
        let mut buffer = Vec::new();

        write_timeline(&system, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Unit;Kind;Link;Start;End;Label;Direction;Peer");
        assert_eq!(lines[1], "X;Calc;;0;2;A;;");
        assert_eq!(lines.len(), 5);
    }
}
