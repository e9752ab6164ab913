use crate::generator::monte_carlo::MonteCarloConfig;
use anyhow::Context;
use detcore::detection::{IntegrationRule, SinglePulseModel, TargetModel};
use detcore::sweep::{SnrRange, SweepConfig, DEFAULT_POINTS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// User-facing description of one detection-curve request.
///
/// When `m` is omitted the empirically optimal M for `n` pulses against
/// `target` is used.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub snr: SnrRange,
    pub pfa: f64,
    pub m: Option<usize>,
    pub n: usize,
    pub points: usize,
    pub model: SinglePulseModel,
    pub target: TargetModel,
    pub monte_carlo: Option<MonteCarloConfig>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            snr: SnrRange {
                min_db: 0.0,
                max_db: 20.0,
            },
            pfa: 1e-6,
            m: None,
            n: 5,
            points: DEFAULT_POINTS,
            model: SinglePulseModel::Rayleigh,
            target: TargetModel::Swerling1,
            monte_carlo: None,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn integration_rule(&self) -> anyhow::Result<IntegrationRule> {
        let rule = match self.m {
            Some(m) => IntegrationRule::new(m, self.n),
            None => IntegrationRule::optimal(self.n, self.target),
        };
        rule.with_context(|| format!("building M-of-N rule (m={:?}, n={})", self.m, self.n))
    }

    pub fn to_sweep_config(&self) -> anyhow::Result<SweepConfig> {
        let snr = SnrRange::new(self.snr.min_db, self.snr.max_db).context("validating SNR range")?;
        let rule = self.integration_rule()?;
        if let Some(mc) = &self.monte_carlo {
            mc.validate().context("validating Monte Carlo settings")?;
        }
        Ok(SweepConfig::new(snr, self.pfa, rule)
            .with_points(self.points)
            .with_model(self.model))
    }
}
