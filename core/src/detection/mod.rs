pub mod binary_integration;
pub mod single_pulse;

pub use binary_integration::{optimum_m, probability_of_detection, IntegrationRule, TargetModel};
pub use single_pulse::{pd_gaussian, pd_rayleigh, threshold_to_noise, SinglePulseModel};
