/// Common error type for detection computations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("parse failure: {0}")]
    Parse(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
}

pub type DetectionResult<T> = Result<T, DetectionError>;

/// Model mapping a linear SNR and false-alarm probability to a single-pulse
/// detection probability.
pub trait DetectionModel {
    fn single_pulse_pd(&self, snr: f64, pfa: f64) -> DetectionResult<f64>;
}

/// Rejects probabilities outside `[0, 1]` (or NaN) without clamping.
pub(crate) fn check_probability(name: &str, value: f64) -> DetectionResult<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetectionError::InvalidParameter(format!(
            "{} must lie in [0, 1], got {}",
            name, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_probability_accepts_bounds() {
        assert_eq!(check_probability("p", 0.0).unwrap(), 0.0);
        assert_eq!(check_probability("p", 1.0).unwrap(), 1.0);
    }

    #[test]
    fn check_probability_rejects_nan_and_out_of_range() {
        assert!(check_probability("p", f64::NAN).is_err());
        assert!(check_probability("p", -0.1).is_err());
        assert!(matches!(
            check_probability("p", 1.5),
            Err(DetectionError::InvalidParameter(_))
        ));
    }
}
