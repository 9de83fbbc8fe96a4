//! Ordered event channel between the simulation and its collaborators.
//!
//! Events published while a drained batch is being handled land in the
//! pending queue and are only delivered by the next [`EventBus::drain`].

use std::collections::VecDeque;

use rand::RngCore;
use serde::Serialize;

use crate::cell::CellInfo;
use crate::grid::MoveRejection;
use crate::objects::{ObjectId, ObjectInfo};
use crate::spatial::{GridPos, Layout, Point};
use crate::turn::TurnInfo;

/// An object together with the cell it was selected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub position: GridPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    /// Select an object, or clear the selection with `None`.
    Select { object: Option<ObjectRef> },
    MoveRequest { target: GridPos },
    TurnStart { turn: TurnInfo },
    /// Emitted by the scrolling collaborator; only re-triggers hit testing.
    EdgeScroll { delta: Point, pointer: Point },
    PointerMotion { pointer: Point },
    PointerButton { button: PointerButton, pointer: Point },
    EndTurnRequested,

    MapObjectSelected { object: ObjectId, position: GridPos },
    ObjectInfoRequested { info: ObjectInfo },
    ObjectInfoHidden,
    CellInfoRequested { info: CellInfo, anchor: Point },
    MoveRejected { object: ObjectId, reason: MoveRejection },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Select,
    MoveRequest,
    TurnStart,
    EdgeScroll,
    PointerMotion,
    PointerButton,
    EndTurnRequested,
    MapObjectSelected,
    ObjectInfoRequested,
    ObjectInfoHidden,
    CellInfoRequested,
    MoveRejected,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Select { .. } => EventKind::Select,
            Event::MoveRequest { .. } => EventKind::MoveRequest,
            Event::TurnStart { .. } => EventKind::TurnStart,
            Event::EdgeScroll { .. } => EventKind::EdgeScroll,
            Event::PointerMotion { .. } => EventKind::PointerMotion,
            Event::PointerButton { .. } => EventKind::PointerButton,
            Event::EndTurnRequested => EventKind::EndTurnRequested,
            Event::MapObjectSelected { .. } => EventKind::MapObjectSelected,
            Event::ObjectInfoRequested { .. } => EventKind::ObjectInfoRequested,
            Event::ObjectInfoHidden => EventKind::ObjectInfoHidden,
            Event::CellInfoRequested { .. } => EventKind::CellInfoRequested,
            Event::MoveRejected { .. } => EventKind::MoveRejected,
        }
    }

    /// Events the core emits for UI and rendering collaborators.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::MapObjectSelected
                | EventKind::ObjectInfoRequested
                | EventKind::ObjectInfoHidden
                | EventKind::CellInfoRequested
                | EventKind::MoveRejected
        )
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    pending: VecDeque<Event>,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: Event) {
        tracing::trace!(kind = ?event.kind(), "event published");
        self.published += 1;
        self.pending.push_back(event);
    }

    /// Takes every event published since the last drain, in publish order.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending).into()
    }

    /// Puts undelivered events back ahead of anything published since the
    /// drain, keeping their original order.
    pub fn requeue_front(&mut self, events: impl DoubleEndedIterator<Item = Event>) {
        for event in events.rev() {
            self.pending.push_front(event);
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total number of events ever published on this bus.
    pub fn published(&self) -> u64 {
        self.published
    }
}

/// What a cell or object needs while handling one event.
pub struct EventContext<'a> {
    pub bus: &'a mut EventBus,
    pub rng: &'a mut dyn RngCore,
    pub layout: Layout,
}

impl<'a> EventContext<'a> {
    pub fn new(bus: &'a mut EventBus, rng: &'a mut dyn RngCore, layout: Layout) -> Self {
        Self { bus, rng, layout }
    }

    pub fn publish(&mut self, event: Event) {
        self.bus.publish(event);
    }
}
