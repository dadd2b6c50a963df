/*
 * 5D Labs NamespaceLabel Operator - Operator Service
 * Copyright (C) 2025 5D Labs
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Operator Service - NamespaceLabel reconciliation and admission gating
//!
//! This service:
//! - Watches `NamespaceLabel` custom resources and fans their changes into
//!   namespace-granularity triggers
//! - Converges each namespace's labels to the merged `NamespaceLabel` state
//! - Serves the validating admission webhook plus health endpoints

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{response::Json, routing::get, Router};
use nslabel_operator::config::OperatorConfig;
use nslabel_operator::controllers::run_controllers;
use nslabel_operator::webhook::{webhook_router, WebhookState};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_PATH: &str = "/config/config.yaml";

fn load_config() -> anyhow::Result<OperatorConfig> {
    let config = match OperatorConfig::from_mounted_file(CONFIG_PATH) {
        Ok(config) => {
            info!("Loaded operator configuration from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("Failed to load configuration, using defaults: {}", e);
            OperatorConfig::default()
        }
    };

    if let Err(validation_error) = config.validate() {
        error!("Configuration validation failed: {}", validation_error);
        anyhow::bail!("invalid configuration: {validation_error}");
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nslabel_operator=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting NamespaceLabel operator v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Arc::new(load_config()?);

    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Admission gate: blacklist is injected once, read-only afterwards
    let state = Arc::new(WebhookState::new(config.blacklist.clone()));
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .merge(webhook_router(state))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(TimeoutLayer::new(Duration::from_secs(10))),
        );

    let addr: SocketAddr = config
        .webhook_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid webhook address: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Admission webhook listening on {}", addr);

    let controllers = run_controllers(client, config.clone());
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    tokio::select! {
        result = controllers => result?,
        result = server => result?,
    }

    info!("NamespaceLabel operator shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn readiness_check() -> Json<Value> {
    Json(json!({"status": "ready"}))
}
