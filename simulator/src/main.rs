use anyhow::Context;
use bridge::model::CurveModel;
use bridge::server::{bridge_bind_address, CurveBridge};
use clap::Parser;
use detcore::detection::{SinglePulseModel, TargetModel};
use detcore::sweep::SnrRange;
use generator::monte_carlo::MonteCarloConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::export::write_curve;
use workflow::runner::{Runner, WorkflowResult};

mod bridge;
mod generator;
mod workflow;

/// Rows shown in the console summary of a curve.
const SUMMARY_ROWS: usize = 11;

#[derive(Parser)]
#[command(author, version, about = "Binary integration (M of N) detection curve driver")]
struct Args {
    /// SNR range in dB as "min,max"
    #[arg(long, default_value = "0,20", allow_hyphen_values = true)]
    snr: String,
    /// Probability of false alarm
    #[arg(long, default_value_t = 1e-6)]
    pfa: f64,
    /// Required detections; the optimum for --target is used when omitted
    #[arg(long)]
    m: Option<usize>,
    /// Pulses integrated
    #[arg(long, default_value_t = 5)]
    n: usize,
    #[arg(long, default_value_t = detcore::sweep::DEFAULT_POINTS)]
    points: usize,
    /// Single-pulse model: rayleigh or gaussian
    #[arg(long, default_value = "rayleigh")]
    model: SinglePulseModel,
    /// Swerling case used to pick the optimum M
    #[arg(long, default_value = "swerling1")]
    target: TargetModel,
    /// Load a workflow config from YAML instead of the flags above
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Write the curve to CSV, or JSON for a .json path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Check the curve against a Monte Carlo simulation with this many trials per point
    #[arg(long)]
    monte_carlo: Option<usize>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Keep the HTTP bridge alive for recompute requests
    #[arg(long, default_value_t = false)]
    serve: bool,
}

impl Args {
    fn to_workflow_config(&self) -> anyhow::Result<WorkflowConfig> {
        let snr: SnrRange = self
            .snr
            .parse()
            .with_context(|| format!("parsing --snr '{}'", self.snr))?;
        Ok(WorkflowConfig {
            snr,
            pfa: self.pfa,
            m: self.m,
            n: self.n,
            points: self.points,
            model: self.model,
            target: self.target,
            monte_carlo: self.monte_carlo.map(|trials| MonteCarloConfig {
                trials,
                seed: self.seed,
            }),
        })
    }
}

fn print_summary(result: &WorkflowResult) {
    let curve = &result.curve;
    let rule = curve.config.rule;
    println!(
        "Binary integration {}-of-{} ({:?}, pfa {:e}), {} points",
        rule.m(),
        rule.n(),
        curve.config.model,
        curve.config.pfa,
        curve.points.len()
    );
    println!("{:>10}  {:>12}", "SNR (dB)", "Pd");

    let last = curve.points.len().saturating_sub(1);
    let rows = SUMMARY_ROWS.min(curve.points.len());
    for row in 0..rows {
        let index = if rows > 1 { row * last / (rows - 1) } else { 0 };
        let point = &curve.points[index];
        println!("{:>10.2}  {:>12.6}", point.snr_db, point.pd);
    }

    if let Some(report) = &result.monte_carlo {
        println!(
            "Monte Carlo ({} trials/point): max deviation {:.4} (max std error {:.4})",
            report.trials, report.max_deviation, report.max_std_error
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        args.to_workflow_config()?
    };

    let runner = Arc::new(Runner::new(workflow_config));
    let result = runner.execute().context("computing detection curve")?;
    print_summary(&result);

    if let Some(path) = &args.output {
        write_curve(path, &result.curve)?;
    }

    if args.serve {
        let bridge = CurveBridge::new(runner.clone());
        bridge.publish(&CurveModel::from_result(&result));
        let address = bridge_bind_address();
        let _server = bridge.spawn(address);
        bridge.publish_status(&format!(
            "HTTP bridge on http://{} (GET /curve, GET /metrics, POST /sweep); Ctrl+C to stop...",
            address
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
