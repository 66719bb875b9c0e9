//! Liquid Silk
//!
//! Hand gestures drive a small physical state (expansion, focus, momentum,
//! camera depth, hue) that a particle renderer draws. Several devices can
//! share one state: a sync server elects a single master whose state every
//! other device mirrors.

pub mod error;
pub mod gesture;
pub mod integration;
pub mod physics;
pub mod sync;

pub use error::{Result, SilkError};
