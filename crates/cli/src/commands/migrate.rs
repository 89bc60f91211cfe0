use strata_migrate::RunOutcome;

use super::{build_migrator, ConnectionArgs};

pub async fn migrate_up(args: &ConnectionArgs) -> anyhow::Result<()> {
    let migrator = build_migrator(args).await?;
    let outcome = migrator.migrate_up().await?;
    report(&outcome, "Applied");
    Ok(())
}

pub async fn migrate_down(args: &ConnectionArgs, steps: usize) -> anyhow::Result<()> {
    let migrator = build_migrator(args).await?;
    let outcome = migrator.migrate_down(steps).await?;
    report(&outcome, "Reverted");
    Ok(())
}

fn report(outcome: &RunOutcome, verb: &str) {
    if outcome.applied_count == 0 {
        println!("Nothing to do; ledger is up to date");
        return;
    }
    for version in &outcome.applied_versions {
        println!("{} {}", verb, version);
    }
    println!(
        "{} {} migration(s) in {}ms",
        verb, outcome.applied_count, outcome.execution_time_ms
    );
}
