use slotmap::SlotMap;

use crate::domain::system::calc_task::{CalcTask, CalcTaskId};
use crate::domain::system::link::Link;
use crate::domain::system::transmission::{Direction, SegmentId, TransferSegment, TransmissionId};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// A processing element: one compute timeline plus a fixed pool of links.
///
/// Without an IO processor (`has_io_cpu == false`) compute and communication share the unit,
/// so a running transfer blocks calculations and a running calculation blocks transfers.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: NodeId,
    has_io_cpu: bool,
    calc_tasks: SlotMap<CalcTaskId, CalcTask>,
    links: Vec<Link>,
}

impl Unit {
    pub fn new(id: NodeId, link_count: usize, duplex: bool, has_io_cpu: bool) -> Self {
        Self { id, has_io_cpu, calc_tasks: SlotMap::with_key(), links: (0..link_count).map(|index| Link::new(index, duplex)).collect() }
    }

    pub fn has_io_cpu(&self) -> bool {
        self.has_io_cpu
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn calc_tasks(&self) -> impl Iterator<Item = &CalcTask> {
        self.calc_tasks.values()
    }

    /// Placed calculations ordered by start time.
    pub fn timeline(&self) -> Vec<&CalcTask> {
        let mut tasks: Vec<&CalcTask> = self.calc_tasks.values().collect();
        tasks.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.task.cmp(&b.task)));
        tasks
    }

    pub fn is_free(&self, time: i64) -> bool {
        self.is_free_duration(time, 1)
    }

    /// True iff the unit can compute during every tick of `[start, start + duration)`.
    pub fn is_free_duration(&self, start: i64, duration: i64) -> bool {
        let end = start + duration;

        if self.calc_tasks.values().any(|task| task.overlaps(start, end)) {
            return false;
        }
        if !self.has_io_cpu && !self.links.iter().all(|link| link.is_idle(start, duration)) {
            return false;
        }
        true
    }

    /// True iff link `index` can carry a `direction` segment towards `peer` during
    /// `[start, start + duration)`.
    ///
    /// Across all its links a unit is connected to at most one peer per tick, so a segment on
    /// another link towards a different peer makes this link unavailable as well.
    pub fn is_link_free_duration(&self, index: usize, start: i64, duration: i64, direction: Direction, peer: &NodeId) -> bool {
        let Some(link) = self.links.get(index) else {
            return false;
        };
        let end = start + duration;

        let paired_elsewhere = self
            .links
            .iter()
            .filter(|other| other.index != index)
            .any(|other| other.overlapping(start, end).any(|segment| &segment.peer != peer));
        if paired_elsewhere {
            return false;
        }

        link.admits(start, duration, direction, peer)
    }

    pub fn has_free_link(&self, start: i64, duration: i64, direction: Direction, peer: &NodeId) -> bool {
        if !self.has_io_cpu && !self.is_free_duration(start, duration) {
            return false;
        }
        (0..self.links.len()).any(|index| self.is_link_free_duration(index, start, duration, direction, peer))
    }

    /// Indices of every link able to take the segment, in pool order.
    pub fn any_free_link(&self, start: i64, duration: i64, direction: Direction, peer: &NodeId) -> Vec<usize> {
        if !self.has_io_cpu && !self.is_free_duration(start, duration) {
            return Vec::new();
        }
        (0..self.links.len()).filter(|index| self.is_link_free_duration(*index, start, duration, direction, peer)).collect()
    }

    /// Places `task` on the compute timeline. The interval must be free.
    pub fn schedule_calc(&mut self, task: NodeId, start: i64, duration: i64) -> Result<CalcTaskId> {
        if !self.is_free_duration(start, duration) {
            return Err(Error::UnitBusy { unit: self.id.clone(), task, start, end: start + duration });
        }

        log::trace!("Unit {} runs task {} in [{}, {})", self.id, task, start, start + duration);
        let calc = CalcTask::new(task, self.id.clone(), start, duration);
        Ok(self.calc_tasks.insert(calc))
    }

    pub fn cancel_calc(&mut self, id: CalcTaskId) -> Option<CalcTask> {
        self.calc_tasks.remove(id)
    }

    /// Places a segment on the first link that can take it.
    ///
    /// # Returns
    /// The link index and the segment key, or `Error::NoFreeLink` if no link qualifies.
    pub fn schedule_transfer(
        &mut self,
        transmission: TransmissionId,
        start: i64,
        duration: i64,
        direction: Direction,
        peer: &NodeId,
    ) -> Result<(usize, SegmentId)> {
        let Some(index) = self.any_free_link(start, duration, direction, peer).first().copied() else {
            return Err(Error::NoFreeLink { unit: self.id.clone(), peer: peer.clone(), start, end: start + duration });
        };

        let segment = self.links[index].insert(transmission, start, duration, direction, peer.clone());
        Ok((index, segment))
    }

    pub fn cancel_transfer(&mut self, link: usize, segment: SegmentId) -> Option<TransferSegment> {
        self.links.get_mut(link)?.remove(segment)
    }

    pub fn runs(&self, task: &NodeId) -> bool {
        self.calc_tasks.values().any(|calc| &calc.task == task)
    }

    pub fn calc_of(&self, task: &NodeId) -> Option<&CalcTask> {
        self.calc_tasks.values().find(|calc| &calc.task == task)
    }

    /// Tasks whose calculation has ended by `time`.
    pub fn finished(&self, time: i64) -> impl Iterator<Item = &NodeId> {
        self.calc_tasks.values().filter(move |calc| calc.is_finished(time)).map(|calc| &calc.task)
    }

    pub fn scheduled(&self) -> impl Iterator<Item = &NodeId> {
        self.calc_tasks.values().map(|calc| &calc.task)
    }

    /// End of the latest calculation, zero for an idle unit.
    pub fn last_tick(&self) -> i64 {
        self.calc_tasks.values().map(|calc| calc.end).max().unwrap_or(0)
    }

    /// Latest end over calculations and transfer segments; nothing is placed at or beyond it.
    pub fn horizon(&self) -> i64 {
        self.links.iter().map(Link::last_tick).fold(self.last_tick(), i64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.calc_tasks.is_empty() && self.links.iter().all(Link::is_empty)
    }
}
