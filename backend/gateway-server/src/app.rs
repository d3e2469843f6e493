//! Process wiring: signal handling, the axum router, and the two listeners
//! (ingress + metrics). This gateway only ever runs in HTTP mode; startup
//! assembles `state::AppState::new` and `dispatcher::Dispatcher::new`
//! before binding either listener.

use std::future::Future;
use std::net;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::oneshot;
use tower_http::trace as tower_trace;

use crate::error::ConfigurationError;
use crate::{configs, dispatcher, logger, metrics, routes, state, utils};

/// # Panics
///
/// Panics if the configured host is not a valid socket address or if signal
/// handler registration fails; both are startup-fatal.
pub async fn server_builder(config: configs::Config) -> Result<(), ConfigurationError> {
    let server_config = config.server.clone();
    let socket_addr = net::SocketAddr::new(server_config.host.parse()?, server_config.port);

    let (tx, rx) = oneshot::channel();

    #[allow(clippy::expect_used)]
    tokio::spawn(async move {
        let mut sig_int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sig_term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sig_quit = signal(SignalKind::quit()).expect("failed to install QUIT handler");
        let mut sig_hup = signal(SignalKind::hangup()).expect("failed to install SIGHUP handler");

        tokio::select! {
            _ = sig_int.recv() => {
                logger::info!("received SIGINT");
                tx.send(()).expect("failed to send shutdown signal");
            }
            _ = sig_term.recv() => {
                logger::info!("received SIGTERM");
                tx.send(()).expect("failed to send shutdown signal");
            }
            _ = sig_quit.recv() => {
                logger::info!("received QUIT");
                tx.send(()).expect("failed to send shutdown signal");
            }
            _ = sig_hup.recv() => {
                logger::info!("received SIGHUP");
                tx.send(()).expect("failed to send shutdown signal");
            }
        }
    });

    #[allow(clippy::expect_used)]
    let shutdown_signal = async {
        rx.await.expect("failed to receive shutdown signal");
        logger::info!("shutdown signal received");
    };

    let service = Service::new(&config);

    logger::info!(host = %server_config.host, port = %server_config.port, "starting gateway server");

    service.http_server(socket_addr, shutdown_signal).await
}

pub struct Service {
    state: Arc<state::AppState>,
}

impl Service {
    pub fn new(config: &configs::Config) -> Self {
        Self {
            state: Arc::new(state::AppState::new(config)),
        }
    }

    pub async fn http_server(
        self,
        socket: net::SocketAddr,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ConfigurationError> {
        let logging_layer = tower_trace::TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| utils::record_fields_from_header(request))
            .on_request(tower_trace::DefaultOnRequest::new().level(tracing::Level::INFO))
            .on_response(
                tower_trace::DefaultOnResponse::new()
                    .level(tracing::Level::INFO)
                    .latency_unit(tower_http::LatencyUnit::Micros),
            )
            .on_failure(
                tower_trace::DefaultOnFailure::new()
                    .latency_unit(tower_http::LatencyUnit::Micros)
                    .level(tracing::Level::ERROR),
            );

        let dispatcher = Arc::new(dispatcher::Dispatcher::new(self.state.clone()));
        let router = routes::router(dispatcher)
            .route_layer(axum::middleware::from_fn(metrics::record_request))
            .layer(logging_layer);

        let listener = tokio::net::TcpListener::bind(socket).await?;

        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

pub async fn metrics_server_builder(config: configs::Config) -> Result<(), ConfigurationError> {
    let listener = config.metrics.tcp_listener().await?;

    let router = axum::Router::new().route("/metrics", axum::routing::get(metrics::metrics_handler));

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let outcome = tokio::signal::ctrl_c().await;
            tracing::info!(?outcome, "metrics server shutting down");
        })
        .await?;

    Ok(())
}
