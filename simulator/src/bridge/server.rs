use crate::bridge::model::CurveModel;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::runner::Runner;
use serde_json::json;
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::{runtime::Builder, task};
use warp::{http::StatusCode, Filter};

pub fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

fn read_model(state: &RwLock<CurveModel>) -> CurveModel {
    match state.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn store_model(state: &RwLock<CurveModel>, model: CurveModel) {
    match state.write() {
        Ok(mut guard) => *guard = model,
        Err(poisoned) => *poisoned.into_inner() = model,
    }
}

/// HTTP bridge exposing the latest curve and accepting recompute requests.
pub struct CurveBridge {
    state: Arc<RwLock<CurveModel>>,
    runner: Arc<Runner>,
}

impl CurveBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CurveModel::default())),
            runner,
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let curve_route = warp::path("curve")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<CurveModel>>| warp::reply::json(&read_model(&state)));

        let metrics_route = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .and(runner_filter.clone())
            .map(|runner: Arc<Runner>| warp::reply::json(&runner.metrics()));

        let sweep_route = warp::path("sweep")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: WorkflowConfig,
                 state: Arc<RwLock<CurveModel>>,
                 runner: Arc<Runner>| async move {
                    let outcome =
                        task::spawn_blocking(move || runner.execute_config(&config)).await;
                    let reply = match outcome {
                        Ok(Ok(result)) => {
                            let model = CurveModel::from_result(&result);
                            let points = model.pd.len();
                            store_model(&state, model);
                            log::info!(
                                "[bridge] recomputed {}-of-{} curve ({} points)",
                                result.curve.config.rule.m(),
                                result.curve.config.rule.n(),
                                points
                            );
                            warp::reply::with_status(
                                warp::reply::json(&json!({"status": "ok", "points": points})),
                                StatusCode::OK,
                            )
                        }
                        Ok(Err(err)) => {
                            log::warn!("[bridge] sweep rejected: {:#}", err);
                            warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "error",
                                    "message": format!("{:#}", err)
                                })),
                                StatusCode::BAD_REQUEST,
                            )
                        }
                        Err(err) => {
                            log::error!("[bridge] sweep task failed: {}", err);
                            warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "error",
                                    "message": "sweep task failed"
                                })),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            )
                        }
                    };
                    Ok::<_, Infallible>(reply)
                },
            );

        curve_route.or(metrics_route).or(sweep_route)
    }

    /// Serves the routes on a dedicated thread with its own runtime.
    pub fn spawn(&self, address: SocketAddr) -> thread::JoinHandle<()> {
        let routes = self.routes();
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    log::error!("[bridge] failed to build runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        })
    }

    pub fn publish(&self, model: &CurveModel) {
        store_model(&self.state, model.clone());
        println!(
            "[bridge] curve points: {}, rule: {}-of-{}",
            model.pd.len(),
            model.m,
            model.n
        );
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> CurveModel {
        read_model(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::monte_carlo::{MonteCarloConfig, MAX_TRIALS};

    fn bridge() -> CurveBridge {
        let cfg = WorkflowConfig {
            m: Some(2),
            n: 3,
            points: 8,
            ..Default::default()
        };
        CurveBridge::new(Arc::new(Runner::new(cfg)))
    }

    #[test]
    fn publish_updates_state() {
        let bridge = bridge();
        let result = bridge.runner.execute().unwrap();
        let model = CurveModel::from_result(&result);
        bridge.publish(&model);
        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.pd.len(), 8);
        assert_eq!((snapshot.m, snapshot.n), (2, 3));
    }

    #[tokio::test]
    async fn post_sweep_recomputes_curve() {
        let bridge = bridge();
        let routes = bridge.routes();
        let request = WorkflowConfig {
            m: Some(3),
            n: 5,
            points: 12,
            ..Default::default()
        };

        let response = warp::test::request()
            .method("POST")
            .path("/sweep")
            .json(&request)
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["points"], 12);

        let response = warp::test::request()
            .method("GET")
            .path("/curve")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let model: CurveModel = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(model.pd.len(), 12);
        assert_eq!((model.m, model.n), (3, 5));
    }

    async fn post_sweep<F>(routes: &F, request: &WorkflowConfig) -> StatusCode
    where
        F: Filter + 'static,
        F::Extract: warp::Reply + Send,
    {
        warp::test::request()
            .method("POST")
            .path("/sweep")
            .json(request)
            .reply(routes)
            .await
            .status()
    }

    #[tokio::test]
    async fn oversized_requests_are_bad_requests() {
        let bridge = bridge();
        let routes = bridge.routes();

        let too_many_points = WorkflowConfig {
            points: detcore::sweep::MAX_POINTS + 1,
            ..Default::default()
        };
        assert_eq!(
            post_sweep(&routes, &too_many_points).await,
            StatusCode::BAD_REQUEST
        );

        let too_many_trials = WorkflowConfig {
            points: 4,
            monte_carlo: Some(MonteCarloConfig {
                trials: MAX_TRIALS + 1,
                seed: 0,
            }),
            ..Default::default()
        };
        assert_eq!(
            post_sweep(&routes, &too_many_trials).await,
            StatusCode::BAD_REQUEST
        );

        assert_eq!(bridge.runner.metrics().rejected, 2);
        assert!(bridge.snapshot().pd.is_empty());
    }

    #[tokio::test]
    async fn invalid_sweep_is_a_bad_request() {
        let bridge = bridge();
        let routes = bridge.routes();
        let request = WorkflowConfig {
            m: Some(7),
            n: 5,
            ..Default::default()
        };

        let response = warp::test::request()
            .method("POST")
            .path("/sweep")
            .json(&request)
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], "error");

        let response = warp::test::request()
            .method("GET")
            .path("/metrics")
            .reply(&routes)
            .await;
        let metrics: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(metrics["rejected"], 1);
        assert!(bridge.snapshot().pd.is_empty());
    }
}
