use crate::generator::monte_carlo::{simulate_curve, MonteCarloReport};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use detcore::sweep::{DetectionCurve, SweepEngine};
use detcore::telemetry::MetricsSnapshot;
use std::sync::Arc;

pub struct WorkflowResult {
    pub curve: DetectionCurve,
    pub monte_carlo: Option<MonteCarloReport>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    engine: Arc<SweepEngine>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            engine: Arc::new(SweepEngine::default()),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.engine.metrics().snapshot()
    }

    /// Runs the workflow this runner was built with.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        self.execute_config(&self.config)
    }

    pub fn execute_config(&self, config: &WorkflowConfig) -> anyhow::Result<WorkflowResult> {
        let sweep_config = match config.to_sweep_config() {
            Ok(sweep_config) => sweep_config,
            Err(err) => {
                self.engine.metrics().record_rejected();
                return Err(err);
            }
        };

        let curve = self
            .engine
            .run(&sweep_config)
            .context("running SNR sweep")?;

        let monte_carlo = match &config.monte_carlo {
            Some(mc) => Some(simulate_curve(&curve, mc).context("running Monte Carlo check")?),
            None => None,
        };

        Ok(WorkflowResult { curve, monte_carlo })
    }
}
