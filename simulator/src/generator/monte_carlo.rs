use anyhow::{bail, Context};
use detcore::detection::{threshold_to_noise, IntegrationRule, SinglePulseModel};
use detcore::math::{db_to_linear, StatsHelper};
use detcore::sweep::DetectionCurve;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Largest number of simulated bursts per SNR point.
pub const MAX_TRIALS: usize = 100_000;

/// Largest number of simulated bursts across a whole curve.
pub const MAX_TOTAL_BURSTS: usize = 20_000_000;

/// Settings for the seeded M-of-N pulse simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub trials: usize,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: 10_000,
            seed: 0,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.trials == 0 {
            bail!("Monte Carlo simulation needs at least one trial");
        }
        if self.trials > MAX_TRIALS {
            bail!(
                "Monte Carlo simulation allows at most {} trials per point, got {}",
                MAX_TRIALS,
                self.trials
            );
        }
        Ok(())
    }
}

/// Empirical detection rates alongside their distance from the analytic curve.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub trials: usize,
    pub empirical: Vec<f64>,
    pub max_deviation: f64,
    pub max_std_error: f64,
}

/// Complex Gaussian sample with unit total power.
fn complex_gaussian(rng: &mut StdRng) -> Complex64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    Complex64::from_polar((-u1.ln()).sqrt(), 2.0 * PI * u2)
}

/// Runs one burst of N pulses through a square-law detector and applies
/// the M-of-N rule.
fn burst_detects(
    rng: &mut StdRng,
    snr: f64,
    threshold: f64,
    rule: IntegrationRule,
    model: SinglePulseModel,
) -> bool {
    let amplitude = snr.sqrt();
    let mut hits = 0;
    for pulse in 0..rule.n() {
        if hits + (rule.n() - pulse) < rule.m() {
            return false;
        }
        let echo = match model {
            SinglePulseModel::Rayleigh => complex_gaussian(rng) * amplitude,
            SinglePulseModel::Gaussian => Complex64::new(amplitude, 0.0),
        };
        let sample = echo + complex_gaussian(rng);
        if sample.norm_sqr() > threshold {
            hits += 1;
            if hits >= rule.m() {
                return true;
            }
        }
    }
    false
}

/// Estimates every point of `curve` by simulation.
pub fn simulate_curve(
    curve: &DetectionCurve,
    config: &MonteCarloConfig,
) -> anyhow::Result<MonteCarloReport> {
    config.validate()?;
    let total = config.trials.saturating_mul(curve.points.len());
    if total > MAX_TOTAL_BURSTS {
        bail!(
            "Monte Carlo simulation of {} points x {} trials exceeds {} bursts",
            curve.points.len(),
            config.trials,
            MAX_TOTAL_BURSTS
        );
    }
    let threshold =
        threshold_to_noise(curve.config.pfa).context("deriving detection threshold")?;
    let rule = curve.config.rule;
    let model = curve.config.model;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut empirical = Vec::with_capacity(curve.points.len());
    let mut max_std_error: f64 = 0.0;
    for point in &curve.points {
        let snr = db_to_linear(point.snr_db);
        let mut detections = 0usize;
        for _ in 0..config.trials {
            if burst_detects(&mut rng, snr, threshold, rule, model) {
                detections += 1;
            }
        }
        empirical.push(detections as f64 / config.trials as f64);
        max_std_error =
            max_std_error.max(StatsHelper::proportion_std_error(point.pd, config.trials));
    }

    let max_deviation = StatsHelper::max_abs_deviation(&empirical, &curve.pd());
    log::debug!(
        "Monte Carlo {} trials/point: max deviation {:.4}, max std error {:.4}",
        config.trials,
        max_deviation,
        max_std_error
    );

    Ok(MonteCarloReport {
        trials: config.trials,
        empirical,
        max_deviation,
        max_std_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use detcore::sweep::{sweep, SnrRange, SweepConfig};

    fn rayleigh_curve() -> DetectionCurve {
        let config = SweepConfig::new(
            SnrRange::new(0.0, 25.0).unwrap(),
            1e-3,
            IntegrationRule::new(3, 5).unwrap(),
        )
        .with_points(6);
        sweep(&config).unwrap()
    }

    #[test]
    fn rayleigh_simulation_tracks_analytic_curve() {
        let curve = rayleigh_curve();
        let report = simulate_curve(
            &curve,
            &MonteCarloConfig {
                trials: 20_000,
                seed: 7,
            },
        )
        .unwrap();
        assert_eq!(report.empirical.len(), curve.points.len());
        assert!(
            report.max_deviation < 0.02,
            "deviation {}",
            report.max_deviation
        );
    }

    #[test]
    fn noise_only_bursts_respect_false_alarm_rate() {
        let mut rng = StdRng::seed_from_u64(3);
        let threshold = threshold_to_noise(0.1).unwrap();
        let rule = IntegrationRule::new(1, 1).unwrap();
        let trials = 50_000;
        let hits = (0..trials)
            .filter(|_| burst_detects(&mut rng, 0.0, threshold, rule, SinglePulseModel::Gaussian))
            .count();
        let rate = hits as f64 / trials as f64;
        assert!((rate - 0.1).abs() < 0.01, "rate {}", rate);
    }

    #[test]
    fn simulation_is_reproducible_for_a_seed() {
        let curve = rayleigh_curve();
        let config = MonteCarloConfig {
            trials: 500,
            seed: 11,
        };
        let first = simulate_curve(&curve, &config).unwrap();
        let second = simulate_curve(&curve, &config).unwrap();
        assert_eq!(first.empirical, second.empirical);
    }

    #[test]
    fn oversized_trial_counts_are_rejected() {
        let curve = rayleigh_curve();
        let per_point = MonteCarloConfig {
            trials: MAX_TRIALS + 1,
            seed: 0,
        };
        assert!(simulate_curve(&curve, &per_point).is_err());

        let wide = SweepConfig::new(
            SnrRange::new(0.0, 10.0).unwrap(),
            1e-3,
            IntegrationRule::new(1, 1).unwrap(),
        )
        .with_points(MAX_TOTAL_BURSTS / MAX_TRIALS + 1);
        let wide_curve = sweep(&wide).unwrap();
        let budget = MonteCarloConfig {
            trials: MAX_TRIALS,
            seed: 0,
        };
        let err = simulate_curve(&wide_curve, &budget).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn zero_trials_is_an_error() {
        let curve = rayleigh_curve();
        let config = MonteCarloConfig {
            trials: 0,
            seed: 0,
        };
        assert!(simulate_curve(&curve, &config).is_err());
    }
}
