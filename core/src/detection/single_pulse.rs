use crate::math::special::erfc;
use crate::prelude::{DetectionError, DetectionModel, DetectionResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Single-pulse detection models selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinglePulseModel {
    /// Rayleigh-fluctuating target in Gaussian noise.
    #[default]
    Rayleigh,
    /// Steady target, North's approximation.
    Gaussian,
}

impl DetectionModel for SinglePulseModel {
    fn single_pulse_pd(&self, snr: f64, pfa: f64) -> DetectionResult<f64> {
        match self {
            SinglePulseModel::Rayleigh => pd_rayleigh(snr, pfa),
            SinglePulseModel::Gaussian => pd_gaussian(snr, pfa),
        }
    }
}

impl FromStr for SinglePulseModel {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rayleigh" => Ok(SinglePulseModel::Rayleigh),
            "gaussian" => Ok(SinglePulseModel::Gaussian),
            other => Err(DetectionError::Parse(format!(
                "unknown single-pulse model '{}'",
                other
            ))),
        }
    }
}

fn check_inputs(snr: f64, pfa: f64) -> DetectionResult<()> {
    if !snr.is_finite() || snr < 0.0 {
        return Err(DetectionError::InvalidParameter(format!(
            "signal-to-noise ratio must be finite and non-negative, got {}",
            snr
        )));
    }
    check_pfa(pfa)
}

fn check_pfa(pfa: f64) -> DetectionResult<()> {
    if !(pfa > 0.0 && pfa < 1.0) {
        return Err(DetectionError::InvalidParameter(format!(
            "probability of false alarm must lie in (0, 1), got {}",
            pfa
        )));
    }
    Ok(())
}

/// Square-law detector threshold, relative to unit noise power, giving `pfa`.
pub fn threshold_to_noise(pfa: f64) -> DetectionResult<f64> {
    check_pfa(pfa)?;
    Ok(-pfa.ln())
}

/// Detection probability for a Rayleigh target: `pfa^(1 / (1 + snr))`.
pub fn pd_rayleigh(snr: f64, pfa: f64) -> DetectionResult<f64> {
    check_inputs(snr, pfa)?;
    Ok(pfa.powf(1.0 / (1.0 + snr)))
}

/// Detection probability for a steady target.
pub fn pd_gaussian(snr: f64, pfa: f64) -> DetectionResult<f64> {
    check_inputs(snr, pfa)?;
    let pd = 0.5 * erfc((-pfa.ln()).sqrt() - (snr + 0.5).sqrt());
    Ok(pd.clamp(0.0, 1.0))
}
