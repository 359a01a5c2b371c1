use migration::{Migrator, MigratorTrait};
use relay_bot::RelayConfig;
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "sportello={level},relay_bot={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    tracing::info!("Database ready");

    let cfg = RelayConfig {
        open_grouping: settings.bot.open_grouping,
        closed_grouping: settings.bot.closed_grouping,
        operator_role: settings.bot.operator_role.clone(),
        feed_url: settings.bot.feed_url.clone(),
        unlinked_policy: settings.bot.unlinked_policy,
    };

    let bot = relay_bot::Bot::builder()
        .token(&settings.bot.token)
        .server(&settings.bot.server)
        .guild(settings.bot.guild_id)
        .engine(engine)
        .relay_config(cfg)
        .build()?;

    bot.run().await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
