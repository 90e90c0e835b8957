//! Diagnosticate.me server
//!
//! HTTP server hosting the navigation shell, plus account administration.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use diagnosticate_kernel::models::{CreateUser, PgUserStore, Role, UserStore};
use diagnosticate_kernel::{AppState, Config, db, routes, session};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Create a user account.
    CreateUser {
        /// Sign-in name.
        #[arg(long)]
        username: String,

        /// Display name shown in the account menu.
        #[arg(long)]
        name: String,

        /// Initial password.
        #[arg(long)]
        password: String,

        /// Roles, comma-separated (USER, ADMIN).
        #[arg(long = "role", value_delimiter = ',')]
        roles: Vec<Role>,

        /// Image file to use as the profile picture.
        #[arg(long)]
        picture: Option<PathBuf>,
    },

    /// Block a user. Their existing sessions end on the next request.
    BlockUser {
        #[arg(long)]
        username: String,
    },

    /// Allow a blocked user to sign in again.
    UnblockUser {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, "Configuration loaded");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::CreateUser {
            username,
            name,
            password,
            roles,
            picture,
        } => {
            let profile_picture = match picture {
                Some(path) => Some(
                    tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => None,
            };

            create_user(
                &config,
                CreateUser {
                    username,
                    name,
                    password,
                    roles,
                    profile_picture,
                },
            )
            .await
        }
        Command::BlockUser { username } => set_active(&config, &username, false).await,
        Command::UnblockUser { username } => set_active(&config, &username, true).await,
    }
}

async fn serve(config: &Config) -> Result<()> {
    info!("Starting Diagnosticate.me");

    let state = AppState::new(config)
        .await
        .context("failed to initialize application state")?;

    let session_layer = session::create_session_layer(
        &config.redis_url,
        session::parse_same_site(&config.cookie_same_site),
        config.session_expiry_hours,
    )
    .await
    .context("failed to create session layer")?;

    // TraceLayer → session → routes
    let app = routes::router()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn create_user(config: &Config, input: CreateUser) -> Result<()> {
    let pool = db::create_pool(config).await?;
    db::run_migrations(&pool).await?;

    let user = PgUserStore::new(pool)
        .create(input)
        .await
        .context("failed to create user")?;

    info!(user_id = %user.id, username = %user.username, roles = ?user.roles, "user created");
    println!("Created user {} ({})", user.username, user.id);

    Ok(())
}

async fn set_active(config: &Config, username: &str, active: bool) -> Result<()> {
    let pool = db::create_pool(config).await?;
    db::run_migrations(&pool).await?;

    let updated = PgUserStore::new(pool)
        .set_active(username, active)
        .await
        .context("failed to update user")?;
    if !updated {
        anyhow::bail!("no user named '{username}'");
    }

    info!(username, active, "user status changed");
    println!(
        "{} user {username}",
        if active { "Unblocked" } else { "Blocked" }
    );

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
