//! Physical state and its per-frame integration

pub mod config;
pub mod integrator;
pub mod state;

pub use config::{HuePalette, IntegratorConfig};
pub use integrator::MomentumIntegrator;
pub use state::{lerp, PhysicalState, Vec3};
