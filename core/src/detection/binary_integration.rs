use crate::math::special::log_sum_exp;
use crate::prelude::{check_probability, DetectionError, DetectionResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// M-of-N detection rule: a target is declared when at least `m` of `n`
/// pulses cross the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrationRule {
    m: usize,
    n: usize,
}

impl IntegrationRule {
    pub fn new(m: usize, n: usize) -> DetectionResult<Self> {
        if n < 1 {
            return Err(DetectionError::InvalidParameter(
                "pulse count N must be at least 1".into(),
            ));
        }
        if m < 1 || m > n {
            return Err(DetectionError::InvalidParameter(format!(
                "required detections M must satisfy 1 <= M <= N, got M={} N={}",
                m, n
            )));
        }
        Ok(Self { m, n })
    }

    /// Rule using the empirically optimal M for `n` pulses against `target`.
    pub fn optimal(n: usize, target: TargetModel) -> DetectionResult<Self> {
        Self::new(optimum_m(n, target)?, n)
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Probability that at least M of N independent pulses, each detected
    /// with probability `p`, are detected.
    ///
    /// The binomial upper tail is summed in log space so that large N and
    /// `p` near either bound neither overflow nor lose the small terms.
    pub fn probability(&self, p: f64) -> DetectionResult<f64> {
        let p = check_probability("single-pulse detection probability", p)?;
        if p == 0.0 {
            return Ok(0.0);
        }
        if p == 1.0 {
            return Ok(1.0);
        }

        let ln_p = p.ln();
        let ln_q = (-p).ln_1p();
        let mut ln_choose = ln_binomial(self.n, self.m);
        let mut terms = Vec::with_capacity(self.n - self.m + 1);
        for k in self.m..=self.n {
            terms.push(ln_choose + k as f64 * ln_p + (self.n - k) as f64 * ln_q);
            if k < self.n {
                ln_choose += ((self.n - k) as f64).ln() - ((k + 1) as f64).ln();
            }
        }

        Ok(log_sum_exp(&terms).exp().clamp(0.0, 1.0))
    }

    /// Evaluates each single-pulse probability independently, preserving order.
    pub fn evaluate_all(&self, probabilities: &[f64]) -> DetectionResult<Vec<f64>> {
        probabilities.iter().map(|&p| self.probability(p)).collect()
    }
}

/// Binary-integration detection probability for `m` of `n` pulses at
/// single-pulse detection probability `p`.
pub fn probability_of_detection(m: usize, n: usize, p: f64) -> DetectionResult<f64> {
    IntegrationRule::new(m, n)?.probability(p)
}

fn ln_binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k)
        .map(|i| ((n - i) as f64).ln() - ((i + 1) as f64).ln())
        .sum()
}

/// Swerling target fluctuation cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetModel {
    Swerling0,
    Swerling1,
    Swerling2,
    Swerling3,
    Swerling4,
}

impl TargetModel {
    /// `(alpha, beta)` of the fit `M_opt = 10^beta * N^alpha`.
    fn optimum_fit(self) -> (f64, f64) {
        match self {
            TargetModel::Swerling0 | TargetModel::Swerling1 | TargetModel::Swerling3 => {
                (0.8, -0.02)
            }
            TargetModel::Swerling2 => (0.91, -0.38),
            TargetModel::Swerling4 => (0.873, -0.27),
        }
    }
}

impl FromStr for TargetModel {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "swerling0" => Ok(TargetModel::Swerling0),
            "swerling1" => Ok(TargetModel::Swerling1),
            "swerling2" => Ok(TargetModel::Swerling2),
            "swerling3" => Ok(TargetModel::Swerling3),
            "swerling4" => Ok(TargetModel::Swerling4),
            other => Err(DetectionError::Parse(format!(
                "unknown target model '{}'",
                other
            ))),
        }
    }
}

/// Empirically optimal M for `n` pulses, rounded and kept within `[1, n]`.
pub fn optimum_m(n: usize, target: TargetModel) -> DetectionResult<usize> {
    if n < 1 {
        return Err(DetectionError::InvalidParameter(
            "pulse count N must be at least 1".into(),
        ));
    }
    let (alpha, beta) = target.optimum_fit();
    let m = 10f64.powf(beta) * (n as f64).powf(alpha);
    Ok((m.round() as usize).clamp(1, n))
}
