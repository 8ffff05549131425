use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Connect to the store and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    // Every pooled connection to `sqlite::memory:` is its own database.
    if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        options.max_connections(1).min_connections(1);
    }

    info!(
        "Connecting to database: {}",
        if database_url.starts_with("sqlite") { "SQLite" } else { "external" }
    );
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;
    info!("Database schema is up to date");

    Ok(db)
}
