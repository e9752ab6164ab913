use crate::workflow::runner::WorkflowResult;
use detcore::detection::SinglePulseModel;
use serde::{Deserialize, Serialize};

/// Latest detection curve as served to plotting clients.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CurveModel {
    pub snr_db: Vec<f64>,
    pub pd: Vec<f64>,
    pub m: usize,
    pub n: usize,
    pub pfa: f64,
    pub model: SinglePulseModel,
    pub monte_carlo_deviation: Option<f64>,
}

impl CurveModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        let config = &result.curve.config;
        Self {
            snr_db: result.curve.snr_db(),
            pd: result.curve.pd(),
            m: config.rule.m(),
            n: config.rule.n(),
            pfa: config.pfa,
            model: config.model,
            monte_carlo_deviation: result.monte_carlo.as_ref().map(|mc| mc.max_deviation),
        }
    }
}
