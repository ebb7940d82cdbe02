use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use portico_bot::{MemoryStore, PhotoStore, Registrar, Telegram};
use portico_web::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portico=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let bot_token = std::env::var("BOT_TOKEN")?;
    let secret =
        std::env::var("PORTICO_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let bot_name = std::env::var("PORTICO_BOT_NAME").unwrap_or_else(|_| "portico_bot".into());
    let db_path = std::env::var("PORTICO_DB_PATH").unwrap_or_else(|_| "portico.db".into());
    let static_dir =
        PathBuf::from(std::env::var("PORTICO_STATIC_DIR").unwrap_or_else(|_| "static".into()));
    let host = std::env::var("PORTICO_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PORTICO_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // One database handle shared by the bot and the web gateway.
    let db = Arc::new(portico_db::Database::open(&PathBuf::from(&db_path))?);

    // Registration bot
    let transport = Arc::new(Telegram::new(bot_token));
    let registrar = Arc::new(Registrar::new(
        db.clone(),
        Arc::new(MemoryStore::new()),
        PhotoStore::new(static_dir.clone()),
    ));
    let bot = tokio::spawn(portico_bot::run_polling(transport, registrar));

    // Web gateway
    let state = AppState {
        db,
        secret,
        bot_name,
    };
    let app = portico_web::router(state, static_dir);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Portico listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => result?,
        _ = bot => anyhow::bail!("bot polling loop exited"),
    }

    Ok(())
}
