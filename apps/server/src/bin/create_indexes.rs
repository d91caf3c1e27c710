//! Index maintenance for the rent and reference tables
//!
//! ```text
//! jeonse-indexes all --yes
//! jeonse-indexes reference --dry-run
//! ```

use anyhow::Context;
use clap::Parser;
use jeonse::{
    config::Config,
    db::maintenance::{indexes_for, IndexGroup, IndexMaintainer, IndexOutcome},
    logging,
};
use sqlx::postgres::PgPoolOptions;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "jeonse-indexes", about = "Create lookup indexes that are missing")]
struct Cli {
    /// Which tables to index
    #[arg(value_enum, default_value_t = IndexGroup::All)]
    group: IndexGroup,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Print the statements without touching the database
    #[arg(long)]
    dry_run: bool,
}

fn confirm(count: usize) -> anyhow::Result<bool> {
    print!("Create up to {count} indexes? Large tables may take a while. [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    let _log_guard = logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    let definitions = indexes_for(cli.group);

    if cli.dry_run {
        for definition in &definitions {
            println!("-- {} ({})", definition.name, definition.description);
            println!("{};", definition.create_sql());
        }
        return Ok(());
    }

    if !cli.yes && !confirm(definitions.len())? {
        println!("Aborted.");
        return Ok(());
    }

    // No statement timeout here: building an index can take minutes.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    let maintainer = IndexMaintainer::new(pool);

    let (mut created, mut skipped, mut failed) = (0usize, 0usize, 0usize);
    let mut touched = BTreeSet::new();
    for definition in &definitions {
        match maintainer.ensure(definition).await? {
            IndexOutcome::AlreadyExists => {
                skipped += 1;
                println!("skip    {} (exists)", definition.name);
            }
            IndexOutcome::Created { size } => {
                created += 1;
                touched.insert(definition.table.clone());
                println!(
                    "created {} on {} [{}]",
                    definition.name,
                    definition.table,
                    size.as_deref().unwrap_or("?")
                );
            }
            IndexOutcome::Failed(reason) => {
                failed += 1;
                println!("FAILED  {}: {}", definition.name, reason);
            }
        }
    }

    for table in &touched {
        if let Err(e) = maintainer.analyze(table).await {
            tracing::warn!(table = %table, error = %e, "ANALYZE failed");
        }
    }

    println!("\n{created} created, {skipped} skipped, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} index(es) could not be created");
    }
    Ok(())
}
