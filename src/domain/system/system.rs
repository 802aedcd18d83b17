use std::collections::{BTreeMap, BTreeSet};

use slotmap::SlotMap;

use crate::domain::graph::graph::Topology;
use crate::domain::system::calc_task::CalcTask;
use crate::domain::system::session::{Session, SessionEntry};
use crate::domain::system::transmission::{Direction, SegmentRef, Transmission, TransmissionId};
use crate::domain::system::unit::Unit;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// The simulated machine: one [`Unit`] per topology node, each with `weight` links.
///
/// Every placement is recorded in the open [`Session`]. `new_session` archives it,
/// `cancel_session` rolls it back exactly.
#[derive(Debug, Clone)]
pub struct System {
    duplex: bool,
    has_io_cpu: bool,
    units: BTreeMap<NodeId, Unit>,
    transmissions: SlotMap<TransmissionId, Transmission>,
    current_session: Session,
    sessions: Vec<Session>,
}

impl System {
    pub fn new(topology: &Topology, duplex: bool, has_io_cpu: bool) -> Self {
        let units: BTreeMap<NodeId, Unit> = topology
            .nodes()
            .map(|node| {
                let link_count = usize::try_from(node.weight).unwrap_or(0);
                (node.id.clone(), Unit::new(node.id.clone(), link_count, duplex, has_io_cpu))
            })
            .collect();

        log::debug!("Built system with {} units (duplex: {}, io cpu: {}).", units.len(), duplex, has_io_cpu);

        Self { duplex, has_io_cpu, units, transmissions: SlotMap::with_key(), current_session: Session::new(), sessions: Vec::new() }
    }

    pub fn duplex(&self) -> bool {
        self.duplex
    }

    pub fn has_io_cpu(&self) -> bool {
        self.has_io_cpu
    }

    pub fn unit(&self, id: &NodeId) -> Option<&Unit> {
        self.units.get(id)
    }

    fn unit_ref(&self, id: &NodeId) -> Result<&Unit> {
        self.units.get(id).ok_or_else(|| Error::UnknownUnit(id.clone()))
    }

    fn unit_mut(&mut self, id: &NodeId) -> Result<&mut Unit> {
        self.units.get_mut(id).ok_or_else(|| Error::UnknownUnit(id.clone()))
    }

    /// Units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.units.keys()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Units able to compute at `time`, in id order.
    pub fn free_units(&self, time: i64) -> Vec<NodeId> {
        self.units.values().filter(|unit| unit.is_free(time)).map(|unit| unit.id.clone()).collect()
    }

    /// Tasks whose calculation has ended by `time`.
    pub fn finished(&self, time: i64) -> BTreeSet<NodeId> {
        self.units.values().flat_map(|unit| unit.finished(time)).cloned().collect()
    }

    /// Tasks placed anywhere, finished or not.
    pub fn scheduled(&self) -> BTreeSet<NodeId> {
        self.units.values().flat_map(|unit| unit.scheduled()).cloned().collect()
    }

    pub fn units_running(&self, task: &NodeId) -> Vec<NodeId> {
        self.units.values().filter(|unit| unit.runs(task)).map(|unit| unit.id.clone()).collect()
    }

    /// The single unit running `task`.
    ///
    /// Fails with `Error::PlacementInvariant` if the task runs on no unit or on several.
    pub fn unit_running(&self, task: &NodeId) -> Result<NodeId> {
        let mut units = self.units_running(task);
        if units.len() != 1 {
            log::error!("Task {} is placed on {} units: {:?}", task, units.len(), units);
            return Err(Error::PlacementInvariant { task: task.clone(), units });
        }
        Ok(units.remove(0))
    }

    pub fn calc_of(&self, task: &NodeId) -> Option<&CalcTask> {
        self.units.values().find_map(|unit| unit.calc_of(task))
    }

    /// Earliest time at or after `time` where `unit` can compute for `duration` ticks.
    pub fn find_calculation_time(&self, time: i64, duration: i64, unit: &NodeId) -> Result<i64> {
        let unit = self.unit_ref(unit)?;
        let horizon = unit.horizon();

        let mut probe = time;
        while !unit.is_free_duration(probe, duration) {
            if probe >= horizon {
                return Err(Error::NoFeasibleTime { unit: unit.id.clone(), from: time });
            }
            probe += 1;
        }
        Ok(probe)
    }

    /// Places `task` on `unit` at the earliest feasible time not before `time`.
    pub fn schedule_calculation(&mut self, task: &NodeId, time: i64, duration: i64, unit: &NodeId) -> Result<CalcTask> {
        let start = self.find_calculation_time(time, duration, unit)?;
        let target = self.unit_mut(unit)?;
        let id = target.schedule_calc(task.clone(), start, duration)?;
        let calc = CalcTask::new(task.clone(), unit.clone(), start, duration);

        self.current_session.push(SessionEntry::Calc { unit: unit.clone(), id });
        Ok(calc)
    }

    /// Earliest time at or after `time` where `source` can send to and `target` can receive from
    /// each other for `duration` ticks.
    pub fn find_transmission_time(&self, time: i64, duration: i64, source: &NodeId, target: &NodeId) -> Result<i64> {
        let source_unit = self.unit_ref(source)?;
        let target_unit = self.unit_ref(target)?;
        let horizon = source_unit.horizon().max(target_unit.horizon());

        let mut probe = time;
        loop {
            while !source_unit.has_free_link(probe, duration, Direction::Outgoing, target) {
                if probe >= horizon {
                    return Err(Error::NoFeasibleTime { unit: source.clone(), from: time });
                }
                probe += 1;
            }

            let outgoing_time = probe;
            while !target_unit.has_free_link(probe, duration, Direction::Ingoing, source) {
                if probe >= horizon {
                    return Err(Error::NoFeasibleTime { unit: target.clone(), from: time });
                }
                probe += 1;
            }

            if probe == outgoing_time {
                return Ok(probe);
            }
        }
    }

    /// Moves `volume` ticks worth of data along `route`, hop by hop.
    ///
    /// Each hop starts at the earliest time both of its ends are free and no earlier than the
    /// end of the previous hop. An empty route means producer and consumer share `target_unit`
    /// and yields an empty transmission ready at `time`. On failure nothing stays placed.
    pub fn schedule_transmission(
        &mut self,
        route: &[(NodeId, NodeId)],
        target_unit: &NodeId,
        time: i64,
        source_task: &NodeId,
        target_task: &NodeId,
        volume: i64,
    ) -> Result<&Transmission> {
        if route.is_empty() {
            let id = self.transmissions.insert(Transmission::Empty {
                source_task: source_task.clone(),
                target_task: target_task.clone(),
                unit: target_unit.clone(),
                ready_time: time,
            });
            self.current_session.push(SessionEntry::Transmission(id));
            return Ok(&self.transmissions[id]);
        }

        let id = self.transmissions.insert(Transmission::Routed {
            source_task: source_task.clone(),
            target_task: target_task.clone(),
            volume,
            route: route.to_vec(),
            segments: Vec::new(),
        });

        let mut placed = Vec::with_capacity(route.len() * 2);
        if let Err(err) = self.place_route(id, route, time, volume, &mut placed) {
            for segment in &placed {
                if let Some(unit) = self.units.get_mut(&segment.unit) {
                    unit.cancel_transfer(segment.link, segment.segment);
                }
            }
            self.transmissions.remove(id);
            return Err(err);
        }

        log::debug!(
            "Transmission {} -> {} over {} hops ends at {}",
            source_task,
            target_task,
            route.len(),
            placed.iter().map(|segment| segment.end).max().unwrap_or(time)
        );

        if let Some(Transmission::Routed { segments, .. }) = self.transmissions.get_mut(id) {
            *segments = placed;
        }
        self.current_session.push(SessionEntry::Transmission(id));
        Ok(&self.transmissions[id])
    }

    fn place_route(&mut self, id: TransmissionId, route: &[(NodeId, NodeId)], time: i64, volume: i64, placed: &mut Vec<SegmentRef>) -> Result<()> {
        let mut time = time;

        for (hop_source, hop_target) in route {
            time = self.find_transmission_time(time, volume, hop_source, hop_target)?;

            let (link, segment) = self.unit_mut(hop_source)?.schedule_transfer(id, time, volume, Direction::Outgoing, hop_target)?;
            placed.push(SegmentRef { unit: hop_source.clone(), link, segment, start: time, end: time + volume, direction: Direction::Outgoing });

            let (link, segment) = self.unit_mut(hop_target)?.schedule_transfer(id, time, volume, Direction::Ingoing, hop_source)?;
            placed.push(SegmentRef { unit: hop_target.clone(), link, segment, start: time, end: time + volume, direction: Direction::Ingoing });

            time += volume;
        }

        Ok(())
    }

    pub fn transmission(&self, id: TransmissionId) -> Option<&Transmission> {
        self.transmissions.get(id)
    }

    pub fn transmissions(&self) -> impl Iterator<Item = (TransmissionId, &Transmission)> {
        self.transmissions.iter()
    }

    /// Archives the open session (if it recorded anything) and opens an empty one.
    pub fn new_session(&mut self) {
        let session = std::mem::take(&mut self.current_session);
        if !session.is_empty() {
            self.sessions.push(session);
        }
    }

    /// Rolls back every placement of the open session, newest first, and empties it.
    pub fn cancel_session(&mut self) {
        let mut session = std::mem::take(&mut self.current_session);
        log::trace!("Cancelling session with {} entries", session.len());

        for entry in session.drain_reversed() {
            match entry {
                SessionEntry::Calc { unit, id } => {
                    if let Some(unit) = self.units.get_mut(&unit) {
                        unit.cancel_calc(id);
                    }
                }
                SessionEntry::Transmission(id) => {
                    let Some(transmission) = self.transmissions.remove(id) else {
                        continue;
                    };
                    for segment in transmission.segments() {
                        if let Some(unit) = self.units.get_mut(&segment.unit) {
                            unit.cancel_transfer(segment.link, segment.segment);
                        }
                    }
                }
            }
        }
    }

    pub fn current_session(&self) -> &Session {
        &self.current_session
    }

    /// Archived sessions, oldest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Latest end over every calculation and transfer segment; the timelines are empty beyond it.
    pub fn horizon(&self) -> i64 {
        self.units.values().map(Unit::horizon).max().unwrap_or(0)
    }

    /// Makespan: the latest calculation end over all units.
    pub fn duration(&self) -> i64 {
        self.units.values().map(Unit::last_tick).max().unwrap_or(0)
    }
}
