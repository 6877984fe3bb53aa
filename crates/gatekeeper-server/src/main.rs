// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gatekeeper server binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gatekeeper_server::jobs::CleanupJob;
use gatekeeper_server::{build_workflow, create_app_state, create_router};
use tower_http::trace::TraceLayer;

mod version;

/// Gatekeeper - links sponsor identities and grants repository access.
#[derive(Parser, Debug)]
#[command(name = "gatekeeper-server", about = "Sponsor identity linking server", version)]
struct Args {
	/// TOML config file (default: /etc/gatekeeper/server.toml)
	#[arg(long, env = "GATEKEEPER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => gatekeeper_server_config::load_config_with_file(path)?,
		None => gatekeeper_server_config::load_config()?,
	};

	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting gatekeeper-server"
	);

	let pool = gatekeeper_server_db::create_pool(&config.database.url).await?;
	gatekeeper_server_db::run_migrations(&pool).await?;

	let workflow = build_workflow(&pool, &config)?;
	let state = create_app_state(pool.clone(), workflow, &config.http, &config.session)?;

	let cleanup = CleanupJob::new(pool.clone()).spawn(config.session.cleanup_interval);

	let app = create_router(state).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	cleanup.abort();
	pool.close().await;
	tracing::info!("Server shutdown complete");
	Ok(())
}
