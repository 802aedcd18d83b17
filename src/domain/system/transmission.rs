use std::fmt;

use slotmap::new_key_type;

use crate::domain::utils::id::NodeId;

new_key_type! {
    pub struct TransmissionId;
    /// Key of a segment inside its link's timeline.
    pub struct SegmentId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ingoing,
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ingoing => write!(f, "in"),
            Direction::Outgoing => write!(f, "out"),
        }
    }
}

/// One side of a transmission hop, occupying a link over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSegment {
    pub transmission: TransmissionId,
    pub start: i64,
    pub end: i64,
    pub direction: Direction,

    /// The unit on the other end of the hop.
    pub peer: NodeId,
}

impl TransferSegment {
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start < self.end && start < end && self.start < end && start < self.end
    }
}

/// Location of a segment: owning unit, link index within the unit, key within the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub unit: NodeId,
    pub link: usize,
    pub segment: SegmentId,
    pub start: i64,
    pub end: i64,
    pub direction: Direction,
}

/// Data produced by `source_task` and consumed by `target_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transmission {
    /// Moved hop by hop along `route`, one outgoing and one ingoing segment per hop.
    Routed { source_task: NodeId, target_task: NodeId, volume: i64, route: Vec<(NodeId, NodeId)>, segments: Vec<SegmentRef> },

    /// Producer and consumer share a unit; the data is available as soon as the producer is.
    Empty { source_task: NodeId, target_task: NodeId, unit: NodeId, ready_time: i64 },
}

impl Transmission {
    pub fn source_task(&self) -> &NodeId {
        match self {
            Transmission::Routed { source_task, .. } | Transmission::Empty { source_task, .. } => source_task,
        }
    }

    pub fn target_task(&self) -> &NodeId {
        match self {
            Transmission::Routed { target_task, .. } | Transmission::Empty { target_task, .. } => target_task,
        }
    }

    /// Time the data is available at the consumer's unit.
    pub fn end_time(&self) -> i64 {
        match self {
            Transmission::Routed { segments, .. } => segments.iter().map(|segment| segment.end).max().unwrap_or(0),
            Transmission::Empty { ready_time, .. } => *ready_time,
        }
    }

    pub fn segments(&self) -> &[SegmentRef] {
        match self {
            Transmission::Routed { segments, .. } => segments,
            Transmission::Empty { .. } => &[],
        }
    }
}
