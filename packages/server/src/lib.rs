#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP gateway for `PromptLift`.
//!
//! Routes prompts to an AI provider and flattens GitHub repositories into a
//! single text blob for code enhancement.

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

use actix_web::{App, HttpServer, http::header, middleware, web};
use tokio::task::JoinHandle;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ErrorBody};
use state::AppState;

pub const HEALTH_PATH: &str = "/health";

/// # Errors
///
/// Returns an error if the server fails to bind or run
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let RunServerResponse { join_handle, .. } = run_server_with_handle(&config)?;

    join_handle.await?
}

pub struct RunServerResponse {
    pub handle: actix_web::dev::ServerHandle,
    pub addrs: Vec<std::net::SocketAddr>,
    pub join_handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Bind and start the server on the current tokio runtime.
///
/// # Errors
///
/// Returns an error if the server fails to bind
pub fn run_server_with_handle(config: &ServerConfig) -> std::io::Result<RunServerResponse> {
    log::info!("Starting PromptLift server on {}:{}", config.host, config.port);
    log::debug!("Server configuration: {config:?}");

    let state = web::Data::new(AppState::from_config(config));
    let json_body_limit = config.json_body_limit;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(json_body_limit)
                    .error_handler(error::json_error_handler),
            )
            .wrap(middleware::from_fn(rate_limit::enforce_rate_limit))
            .wrap(default_headers())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?;

    let addrs = server.addrs();
    let server = server.run();
    let handle = server.handle();

    let join_handle = tokio::spawn(server);

    Ok(RunServerResponse {
        handle,
        addrs,
        join_handle,
    })
}

fn default_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
}
