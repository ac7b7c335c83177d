use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use clap::Parser;
use guard_lib::config::Settings;
use guard_lib::router::create_router;
use guard_lib::store::FlatFileStore;
use guard_lib::{AppState, CurrentUser};
use passguard_common::UserId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Password-rotation policy server.
#[derive(Parser, Debug)]
#[command(name = "passguard")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "passguard.toml")]
    config: String,

    /// Override the bind address from the config
    #[arg(long)]
    bind: Option<SocketAddr>,
}

/// Demo identity layer standing in for a real auth system: trusts
/// `x-passguard-user` / `x-passguard-admin` headers and inserts the
/// `CurrentUser` extension the gate middleware consumes. A production host
/// replaces this with its session layer.
async fn identity(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get("x-passguard-user")
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    if let Some(id) = id {
        let is_admin = request
            .headers()
            .get("x-passguard-admin")
            .is_some_and(|v| v == "1");
        request.extensions_mut().insert(CurrentUser {
            id: UserId::from(id),
            is_admin,
        });
    }

    next.run(request).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    let store = FlatFileStore::new(&settings.data_dir)?;
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(store, settings));

    // First-run activation: arms the rotation requirement once, the same
    // operation the admin action performs on demand.
    state.clock.arm_if_unarmed().await?;

    let app = create_router(Arc::clone(&state)).layer(axum::middleware::from_fn(identity));

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
