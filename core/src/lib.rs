//! Detection-probability core for binary (M-of-N) integration.
//!
//! Single-pulse models turn SNR and false-alarm probability into a per-pulse
//! detection probability; the binary-integration engine combines N such
//! pulses into a composite detection probability; the sweep ties both to an
//! SNR grid in decibels.

pub mod detection;
pub mod math;
pub mod prelude;
pub mod sweep;
pub mod telemetry;

pub use detection::{probability_of_detection, IntegrationRule, SinglePulseModel};
pub use prelude::{DetectionError, DetectionModel, DetectionResult};
pub use sweep::{sweep, DetectionCurve, SnrRange, SweepConfig};
