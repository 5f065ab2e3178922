pub mod config;
pub mod error;
pub mod orchestrator;
pub mod passive;
pub mod records;
pub mod schedule;
pub mod upsample;

pub use config::GridConfig;
pub use error::{GridError, Result};
pub use orchestrator::{ResolutionOrchestrator, ResolutionPhase};
pub use passive::PassiveEdgeSelector;
pub use schedule::ScheduleComputer;
pub use upsample::GridUpsampler;
