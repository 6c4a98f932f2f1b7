//! Portfolio API - Cognito and S3 operations behind one HTTP entry point.
//!
//! This binary runs under the AWS Lambda runtime by default, or as a local
//! HTTP server with `serve`.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_api::{
    config::{Cli, Command, GatewayConfig, LambdaConfig, SecretHashConfig, ServeConfig},
    secret_hash,
    server::{create_local_router, lambda, Gateway},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Lambda(config) => run_lambda(config).await,
        Command::Serve(config) => run_serve(config).await,
        Command::SecretHash(config) => run_secret_hash(config),
    }
}

// =============================================================================
// Lambda Command
// =============================================================================

async fn run_lambda(config: LambdaConfig) -> ExitCode {
    init_logging(config.verbose, true);

    if let Err(e) = config.gateway.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let gateway = Gateway::from_config(&config.gateway).await;
    info!(routes = gateway.routes().len(), "Starting Lambda runtime");

    if let Err(e) = lambda::run(gateway).await {
        error!("Lambda runtime error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose, false);

    if let Err(e) = config.gateway.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Portfolio API v{}", env!("CARGO_PKG_VERSION"));
    log_configuration(&config.gateway);

    let gateway = Gateway::from_config(&config.gateway).await;
    let router = create_local_router(gateway, !config.no_tracing);

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -X POST http://{}/auth/v1/login -d '{{\"username\":\"..\",\"password\":\"..\"}}'",
        addr
    );
    info!("    curl 'http://{}/s3/fetch-url?file=<key>'", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn log_configuration(config: &GatewayConfig) {
    info!("Configuration:");
    match config.identity_settings() {
        Some(settings) => {
            info!("  Cognito region: {}", settings.region);
            info!("  Cognito client id: {}", settings.client_id);
            if settings.client_secret.is_none() {
                warn!("  Cognito client secret: not set (refresh and password reset will fail)");
            }
        }
        None => warn!("  Cognito: NOT CONFIGURED - set REGION and COGNITO_CLIENT_ID"),
    }
    if let Some(ref endpoint) = config.cognito_endpoint {
        info!("  Cognito endpoint: {}", endpoint);
    }

    match config.bucket() {
        Some(bucket) => info!("  S3 bucket: {}", bucket),
        None => warn!("  S3 bucket: NOT CONFIGURED - set PORTFOLIO_S3_BUCKET_NAME"),
    }
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  Pre-signed URL lifetime: {}s", config.presign_ttl);
}

/// Initialize the tracing/logging subsystem.
///
/// Under Lambda the output goes to CloudWatch, which adds its own timestamps
/// and does not render colors.
fn init_logging(verbose: bool, lambda: bool) {
    let env_filter = if verbose {
        "portfolio_api=debug,tower_http=debug"
    } else {
        "portfolio_api=info,tower_http=info"
    };

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| env_filter.into()),
    );

    if lambda {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .without_time(),
            )
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

// =============================================================================
// Secret Hash Command
// =============================================================================

fn run_secret_hash(config: SecretHashConfig) -> ExitCode {
    let (client_id, client_secret) = match config.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", secret_hash(&config.username, client_id, client_secret));
    ExitCode::SUCCESS
}
