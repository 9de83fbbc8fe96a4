use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::{
    cell::CellInfo,
    event::{Event, EventBus, EventContext},
    grid::Grid,
    rng::{RngManager, GROWTH_STREAM},
    spatial::Layout,
    turn::{TurnClock, TurnInfo},
};

/// Upper bound on ticks spent draining cascades before a turn is reported.
const MAX_SETTLE_TICKS: u64 = 64;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub layout: Layout,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    grid: Grid,
    clock: TurnClock,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings, grid: Grid) -> Self {
        Self {
            settings,
            grid,
            clock: TurnClock::new(),
        }
    }

    pub fn starting_at(mut self, turn: TurnInfo) -> Self {
        self.clock = TurnClock::starting_at(turn);
        self
    }

    /// The first turn start is queued and applied by the first tick.
    pub fn build(self) -> Engine {
        let mut bus = EventBus::new();
        bus.publish(Event::TurnStart {
            turn: self.clock.current(),
        });
        Engine {
            rng: RngManager::new(self.settings.seed),
            bus,
            clock: self.clock,
            grid: self.grid,
            settings: self.settings,
            tick: 0,
        }
    }
}

/// Top-level driver: owns the bus, the clock, the map and the random streams.
pub struct Engine {
    rng: RngManager,
    bus: EventBus,
    clock: TurnClock,
    grid: Grid,
    settings: EngineSettings,
    tick: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    pub tick: u64,
    pub delivered: usize,
    pub handled: usize,
    /// Events addressed to UI and rendering collaborators, in publish order.
    pub outbound: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    pub turn: TurnInfo,
    pub tick: u64,
    pub objects: usize,
    pub growth_density: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapSnapshot {
    pub scenario: String,
    pub seed: u64,
    pub turn: TurnInfo,
    pub size_x: i32,
    pub size_y: i32,
    pub cells: Vec<CellInfo>,
}

impl Engine {
    pub fn publish(&mut self, event: Event) {
        self.bus.publish(event);
    }

    /// Delivers everything published before this call. Events published
    /// while handling wait for the next tick.
    ///
    /// If handling an event fails, the events after it in the batch are put
    /// back at the front of the bus and the error is returned.
    pub fn tick(&mut self) -> Result<TickSummary> {
        self.tick += 1;
        let mut batch = self.bus.drain().into_iter();
        let mut summary = TickSummary {
            tick: self.tick,
            delivered: batch.len(),
            handled: 0,
            outbound: Vec::new(),
        };

        while let Some(event) = batch.next() {
            if event.is_outbound() {
                tracing::debug!(tick = self.tick, kind = ?event.kind(), "outbound event");
                summary.outbound.push(event);
                continue;
            }
            if event == Event::EndTurnRequested {
                self.end_turn();
                summary.handled += 1;
                continue;
            }

            let mut rng = self.rng.stream(GROWTH_STREAM);
            let mut ctx = EventContext::new(&mut self.bus, &mut rng, self.settings.layout);
            match self.grid.handle_event(&event, &mut ctx) {
                Ok(true) => summary.handled += 1,
                Ok(false) => {}
                Err(err) => {
                    let remaining = batch.len();
                    self.bus.requeue_front(batch);
                    tracing::warn!(tick = self.tick, remaining, %err, "event failed");
                    return Err(err).with_context(|| {
                        format!("tick {} failed on {:?}", self.tick, event.kind())
                    });
                }
            }
        }
        Ok(summary)
    }

    /// Ticks until nothing is pending.
    pub fn settle(&mut self) -> Result<Vec<TickSummary>> {
        let mut ticks = Vec::new();
        while !self.bus.is_empty() {
            if ticks.len() as u64 >= MAX_SETTLE_TICKS {
                bail!(
                    "event cascade did not settle within {} ticks",
                    MAX_SETTLE_TICKS
                );
            }
            ticks.push(self.tick()?);
        }
        Ok(ticks)
    }

    /// Advances the calendar and queues the turn start for the next tick.
    pub fn end_turn(&mut self) -> TurnInfo {
        let turn = self.clock.advance();
        tracing::info!(scenario = %self.settings.scenario_name, %turn, "turn started");
        self.bus.publish(Event::TurnStart { turn });
        turn
    }

    pub fn run(&mut self, turns: u64) -> Result<()> {
        self.run_with_hook(turns, |_| {})
    }

    /// Plays `turns` turns: each one is settled, reported, then ended.
    pub fn run_with_hook<F>(&mut self, turns: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TurnSummary),
    {
        for _ in 0..turns {
            self.settle()?;
            hook(&self.turn_summary());
            self.end_turn();
        }
        Ok(())
    }

    pub fn turn_summary(&self) -> TurnSummary {
        let objects: usize = self.grid.cells().map(|cell| cell.objects().len()).sum();
        let growth_density: u64 = self
            .grid
            .cells()
            .flat_map(|cell| cell.objects())
            .filter_map(|object| object.growth())
            .map(|growth| u64::from(growth.density()))
            .sum();
        TurnSummary {
            turn: self.clock.current(),
            tick: self.tick,
            objects,
            growth_density,
        }
    }

    pub fn snapshot(&self) -> MapSnapshot {
        let (size_x, size_y) = self.grid.size();
        MapSnapshot {
            scenario: self.settings.scenario_name.clone(),
            seed: self.settings.seed,
            turn: self.clock.current(),
            size_x,
            size_y,
            cells: self.grid.snapshot(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_turn(&self) -> TurnInfo {
        self.clock.current()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn pending_events(&self) -> usize {
        self.bus.len()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}
