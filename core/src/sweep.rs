use crate::detection::{IntegrationRule, SinglePulseModel};
use crate::math::units::{db_to_linear, linear_to_db};
use crate::prelude::{DetectionError, DetectionModel, DetectionResult};
use crate::telemetry::{LogManager, MetricsRecorder};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

/// Number of SNR samples in a sweep unless configured otherwise.
pub const DEFAULT_POINTS: usize = 200;

/// Largest number of SNR samples a single sweep may request.
pub const MAX_POINTS: usize = 100_000;

/// Largest accepted SNR bound magnitude in dB; `10^(dB/10)` stays a normal,
/// finite `f64` within it.
pub const MAX_SNR_DB: f64 = 300.0;

/// Inclusive SNR interval in decibels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnrRange {
    pub min_db: f64,
    pub max_db: f64,
}

impl SnrRange {
    pub fn new(min_db: f64, max_db: f64) -> DetectionResult<Self> {
        let range = Self { min_db, max_db };
        range.validate()?;
        Ok(range)
    }

    fn validate(&self) -> DetectionResult<()> {
        if !self.min_db.is_finite() || !self.max_db.is_finite() {
            return Err(DetectionError::InvalidParameter(format!(
                "SNR range bounds must be finite, got {}..{}",
                self.min_db, self.max_db
            )));
        }
        if self.min_db.abs() > MAX_SNR_DB || self.max_db.abs() > MAX_SNR_DB {
            return Err(DetectionError::InvalidParameter(format!(
                "SNR range bounds must lie within +/-{} dB, got {}..{}",
                MAX_SNR_DB, self.min_db, self.max_db
            )));
        }
        Ok(())
    }
}

impl FromStr for SnrRange {
    type Err = DetectionError;

    /// Parses `"min,max"` in decibels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bounds = s
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|err| {
                    DetectionError::Parse(format!("SNR bound '{}': {}", part.trim(), err))
                })
            })
            .collect::<DetectionResult<Vec<f64>>>()?;

        match bounds.as_slice() {
            [min_db, max_db] => SnrRange::new(*min_db, *max_db),
            _ => Err(DetectionError::Parse(format!(
                "expected 'min,max' SNR range in dB, got '{}'",
                s
            ))),
        }
    }
}

/// Everything needed to produce one detection curve.
#[derive(Debug, Clone, Serialize)]
pub struct SweepConfig {
    pub snr: SnrRange,
    pub pfa: f64,
    pub rule: IntegrationRule,
    pub points: usize,
    pub model: SinglePulseModel,
}

impl SweepConfig {
    pub fn new(snr: SnrRange, pfa: f64, rule: IntegrationRule) -> Self {
        Self {
            snr,
            pfa,
            rule,
            points: DEFAULT_POINTS,
            model: SinglePulseModel::default(),
        }
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    pub fn with_model(mut self, model: SinglePulseModel) -> Self {
        self.model = model;
        self
    }

    fn validate(&self) -> DetectionResult<()> {
        self.snr.validate()?;
        if !(2..=MAX_POINTS).contains(&self.points) {
            return Err(DetectionError::InvalidParameter(format!(
                "a sweep needs between 2 and {} points, got {}",
                MAX_POINTS, self.points
            )));
        }
        Ok(())
    }

    /// SNR grid in decibels, evenly spaced and inclusive of both bounds.
    pub fn snr_grid_db(&self) -> Array1<f64> {
        Array1::linspace(self.snr.min_db, self.snr.max_db, self.points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub snr_db: f64,
    pub pd: f64,
}

/// Detection probability versus SNR, ordered as the grid was generated.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionCurve {
    pub config: SweepConfig,
    pub points: Vec<CurvePoint>,
}

impl DetectionCurve {
    pub fn snr_db(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.snr_db).collect()
    }

    pub fn pd(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.pd).collect()
    }

    pub fn to_json(&self) -> DetectionResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| DetectionError::Serialization(err.to_string()))
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("snr_db,pd\n");
        for point in &self.points {
            let _ = writeln!(out, "{},{}", point.snr_db, point.pd);
        }
        out
    }
}

/// Runs SNR sweeps and reports them to the shared telemetry.
pub struct SweepEngine {
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl SweepEngine {
    pub fn new(metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            logger: LogManager::new(),
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn run(&self, config: &SweepConfig) -> DetectionResult<DetectionCurve> {
        match evaluate(config) {
            Ok(points) => {
                self.metrics.record_sweep(points.len());
                self.logger.record(&format!(
                    "sweep {}-of-{} {:?} pfa {:e}: {} points over {}..{} dB",
                    config.rule.m(),
                    config.rule.n(),
                    config.model,
                    config.pfa,
                    points.len(),
                    config.snr.min_db,
                    config.snr.max_db
                ));
                Ok(DetectionCurve {
                    config: config.clone(),
                    points,
                })
            }
            Err(err) => {
                self.metrics.record_rejected();
                self.logger.warn(&format!("sweep rejected: {}", err));
                Err(err)
            }
        }
    }
}

impl Default for SweepEngine {
    fn default() -> Self {
        Self::new(Arc::new(MetricsRecorder::new()))
    }
}

fn evaluate(config: &SweepConfig) -> DetectionResult<Vec<CurvePoint>> {
    config.validate()?;
    config
        .snr_grid_db()
        .iter()
        .map(|&db| {
            let snr = db_to_linear(db);
            let p = config.model.single_pulse_pd(snr, config.pfa)?;
            let pd = config.rule.probability(p)?;
            Ok(CurvePoint {
                snr_db: linear_to_db(snr),
                pd,
            })
        })
        .collect()
}

/// Computes a detection curve with a throwaway engine.
pub fn sweep(config: &SweepConfig) -> DetectionResult<DetectionCurve> {
    SweepEngine::default().run(config)
}
