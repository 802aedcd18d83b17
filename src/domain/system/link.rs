use slotmap::SlotMap;

use crate::domain::system::transmission::{Direction, SegmentId, TransferSegment, TransmissionId};
use crate::domain::utils::id::NodeId;

/// A communication channel of a unit, holding the transfer segments placed on it.
#[derive(Debug, Clone)]
pub struct Link {
    pub index: usize,
    pub duplex: bool,
    segments: SlotMap<SegmentId, TransferSegment>,
}

impl Link {
    pub fn new(index: usize, duplex: bool) -> Self {
        Self { index, duplex, segments: SlotMap::with_key() }
    }

    pub fn segments(&self) -> impl Iterator<Item = &TransferSegment> {
        self.segments.values()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&TransferSegment> {
        self.segments.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments sharing at least one tick with `[start, end)`.
    pub fn overlapping(&self, start: i64, end: i64) -> impl Iterator<Item = &TransferSegment> {
        self.segments.values().filter(move |segment| segment.overlaps(start, end))
    }

    /// No segment at all during `[start, start + duration)`, whatever its direction or peer.
    pub fn is_idle(&self, start: i64, duration: i64) -> bool {
        self.overlapping(start, start + duration).next().is_none()
    }

    /// True iff this link's own segments admit a new `direction` segment towards `peer`
    /// during `[start, start + duration)`.
    ///
    /// A simplex link admits nothing next to an existing segment. A duplex link admits an
    /// opposite direction segment, but only if it talks to the same peer.
    pub fn admits(&self, start: i64, duration: i64, direction: Direction, peer: &NodeId) -> bool {
        self.overlapping(start, start + duration).all(|segment| {
            if !self.duplex {
                return false;
            }
            segment.direction != direction && &segment.peer == peer
        })
    }

    /// Inserts a segment unconditionally; the owning unit checks availability first.
    pub fn insert(&mut self, transmission: TransmissionId, start: i64, duration: i64, direction: Direction, peer: NodeId) -> SegmentId {
        self.segments.insert(TransferSegment { transmission, start, end: start + duration, direction, peer })
    }

    pub fn remove(&mut self, id: SegmentId) -> Option<TransferSegment> {
        self.segments.remove(id)
    }

    /// Latest end over all segments, zero for an unused link.
    pub fn last_tick(&self) -> i64 {
        self.segments.values().map(|segment| segment.end).max().unwrap_or(0)
    }
}
