use anyhow::Result;
use colored::*;

use crate::api::{HealthStatus, UserBackend};
use crate::cli::{AppContext, GlobalArgs};

pub async fn handle_health_command(global: &GlobalArgs) -> Result<()> {
    let context = AppContext::load(global)?;
    let session = context.session()?;
    let backend = context.backend(&session)?;

    println!("Checking {} ...", backend.base_url().cyan());
    let health = backend.health().await.map_err(|e| {
        anyhow::anyhow!("Health check failed: {} ({})", e.user_message(), e)
    })?;

    print_health(&health);
    if !health.is_ok() {
        anyhow::bail!("Backend reports status '{}'", health.status);
    }
    Ok(())
}

fn print_health(health: &HealthStatus) {
    let status = if health.is_ok() {
        health.status.green().bold()
    } else {
        health.status.red().bold()
    };
    println!("  Status:   {}", status);
    if let Some(database) = &health.database {
        println!("  Database: {}", database);
    }
    if let Some(timestamp) = &health.timestamp {
        println!("  Time:     {}", timestamp);
    }
    if let Some(debug) = health.debug {
        println!("  Debug:    {}", debug);
    }
}
