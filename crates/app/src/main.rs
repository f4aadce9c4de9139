use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budgetd={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] section configured, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = connect_database(&server.database).await?;
    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await?;

    server::run(engine, db, &server.addr()).await;

    Ok(())
}

async fn connect_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
