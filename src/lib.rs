pub mod cell;
pub mod engine;
pub mod event;
pub mod grid;
pub mod objects;
pub mod resources;
pub mod rng;
pub mod scenario;
pub mod spatial;
pub mod turn;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickSummary, TurnSummary};
pub use event::{Event, EventBus};
pub use grid::{Grid, GridError, MoveOutcome, MoveRejection};
pub use scenario::{MapParseError, Scenario, ScenarioLoader};
