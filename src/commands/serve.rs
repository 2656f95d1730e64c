use anyhow::{Context, Result};

use edumon::api::ApiServer;
use edumon::config::Config;
use edumon::metrics;
use edumon::storage::create_sqlite_store;

/// Start the dashboard API server
pub async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = host {
        let port = server_config.bind_address.port();
        server_config.bind_address = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("Invalid bind host: {host}"))?;
    }
    if let Some(port) = port {
        server_config.bind_address.set_port(port);
    }

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    let store = create_sqlite_store(&config.database.sqlite_path).with_context(|| {
        format!(
            "Failed to open database: {}",
            config.database.sqlite_path.display()
        )
    })?;

    let server = ApiServer::new(server_config, store).context("Failed to create API server")?;
    let bind_address = server.info().bind_address;

    println!("{}", server.info().display());
    println!("Database: {}", config.database.sqlite_path.display());
    println!();
    println!("API Endpoints:");
    println!("  GET  /api/health                        - Health check");
    println!("  GET  /metrics                           - Prometheus metrics endpoint");
    println!("  GET  /api/schools                       - List schools (filters, pagination)");
    println!("  GET  /api/schools/stats                 - School statistics");
    println!("  GET  /api/schools/analysis/persebaran   - Regional spread analysis");
    println!("  GET  /api/schools/analysis/comparison   - Compare two regencies");
    println!("  GET  /api/students                      - List student statistics");
    println!("  POST /api/students                      - Ingest student statistics");
    println!("  GET  /api/students/stats                - Overall student statistics");
    println!("  GET  /api/programs                      - List education programs");
    println!("  GET  /api/dashboard/stats               - Dashboard overview");
    println!("  POST /api/auth/login                    - Check admin credentials");
    println!("  GET  /api/admin/users                   - Manage admin accounts");
    println!();
    println!("API server listening on http://{bind_address}");
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to wait for Ctrl+C");
                }
            }
        })
        .await?;

    println!("API server stopped.");
    Ok(())
}
