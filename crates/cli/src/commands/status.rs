use serde_json::json;
use strata_migrate::MigrationStatus;

use super::{build_migrator, ConnectionArgs};

pub async fn status(args: &ConnectionArgs, as_json: bool) -> anyhow::Result<()> {
    let migrator = build_migrator(args).await?;
    let statuses = migrator.status().await?;

    if as_json {
        let rows: Vec<_> = statuses
            .iter()
            .map(|(migration, status)| match status {
                MigrationStatus::Applied { applied_at } => json!({
                    "version": migration.version,
                    "name": migration.name,
                    "status": "applied",
                    "applied_at": applied_at.to_rfc3339(),
                }),
                MigrationStatus::Pending => json!({
                    "version": migration.version,
                    "name": migration.name,
                    "status": "pending",
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No migrations found in {}", args.path.display());
        return Ok(());
    }

    println!("Migration status for schema '{}':", args.schema);
    let mut pending = 0;
    for (migration, status) in &statuses {
        match status {
            MigrationStatus::Applied { applied_at } => {
                println!(
                    "  applied  {} {} ({})",
                    migration.version,
                    migration.name,
                    applied_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            MigrationStatus::Pending => {
                pending += 1;
                println!("  pending  {} {}", migration.version, migration.name);
            }
        }
    }
    println!(
        "\n{} applied, {} pending",
        statuses.len() - pending,
        pending
    );
    Ok(())
}
