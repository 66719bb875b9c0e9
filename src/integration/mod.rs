//! Integration layer wiring detector, classifier, integrator, sync and renderer

pub mod config;
pub mod orchestrator;
pub mod render;

pub use config::{OrchestratorConfig, SilkConfig};
pub use orchestrator::{
    Orchestrator, OrchestratorBuilder, OrchestratorCommand, OrchestratorEvent, OrchestratorHandle,
};
pub use render::{LoggingSink, RenderSink};
