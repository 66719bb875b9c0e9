//! Hand gesture input: landmark samples in, debounced gesture events out

pub mod classifier;
pub mod config;
pub mod debounce;
pub mod history;
pub mod landmarks;
pub mod simulate;

pub use classifier::{GestureClassifier, GestureEvent, GestureLabel, Intent};
pub use config::GestureConfig;
pub use debounce::DebounceGate;
pub use landmarks::{DetectorFrame, Landmark, LandmarkSample};
pub use simulate::SimulatedDetector;
