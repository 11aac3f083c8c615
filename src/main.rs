//! Hackboard CLI entry point

mod cli;

use crate::cli::{Cli, Commands, RoleCommands};
use anyhow::{Context, Result};
use hackboard::auth::{project_invite_hash, UserProfile};
use hackboard::server::run_server;
use hackboard::storage::{
    DataStore, MemoryStore, PostgresConfig, PostgresStore, ProfileStore, RoleStore, Seed,
};
use hackboard::{AllowListPolicy, EventRole, Hackboard, Secret, ServiceConfig, SessionToken};
use chrono::{Duration, Utc};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Only commands that touch the database need it configured
    let get_db_config = || -> Result<PostgresConfig> {
        if let Some(url) = &cli.database_url {
            PostgresConfig::from_url(url).context("Invalid DATABASE_URL")
        } else {
            PostgresConfig::from_env().context("DATABASE_URL not set")
        }
    };

    match &cli.command {
        Commands::Serve {
            bind,
            admin_ids,
            memory,
            seed,
        } => {
            let store: Arc<dyn DataStore> = if *memory {
                info!("Using in-memory store; data is lost on exit");
                Arc::new(MemoryStore::new())
            } else {
                Arc::new(PostgresStore::new(get_db_config()?).await?)
            };
            if let Some(path) = seed {
                load_seed(path, store.as_ref()).await?;
            }
            serve(&cli, bind, admin_ids, store).await
        }
        Commands::Init => init(get_db_config()?).await,
        Commands::Session {
            user,
            email,
            ttl_hours,
        } => session(&cli, user, email.clone(), *ttl_hours),
        Commands::Role { command } => role(get_db_config()?, command).await,
        Commands::ProjectLink { project_id } => project_link(&cli, project_id),
    }
}

fn secret(value: &Option<String>, name: &str) -> Result<Secret> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(Secret::new)
        .with_context(|| format!("{} must be set", name))
}

fn service_config(cli: &Cli) -> Result<ServiceConfig> {
    Ok(ServiceConfig::new(
        secret(&cli.session_secret, "HACKBOARD_SESSION_SECRET")?,
        secret(&cli.invite_secret, "HACKBOARD_INVITE_SECRET")?,
        cli.base_url.as_str(),
    ))
}

async fn serve(cli: &Cli, bind: &str, admin_ids: &str, store: Arc<dyn DataStore>) -> Result<()> {
    let bind_addr: SocketAddr = bind.parse().context("Invalid bind address")?;
    let admins = AllowListPolicy::parse(admin_ids);
    let config = service_config(cli)?;

    info!(
        base_url = %config.base_url,
        global_admins = admins.len(),
        "Starting Hackboard server"
    );

    let service = Arc::new(Hackboard::new(store, Arc::new(admins), config));
    run_server(bind_addr, service).await
}

async fn load_seed(path: &Path, store: &dyn DataStore) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    let seed = Seed::from_json(&json)
        .with_context(|| format!("Invalid seed file {}", path.display()))?;
    seed.apply(store).await.context("Failed to load seed data")?;
    Ok(())
}

async fn init(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;
    println!("Database schema initialized successfully");
    Ok(())
}

fn session(cli: &Cli, user: &str, email: Option<String>, ttl_hours: i64) -> Result<()> {
    let secret = secret(&cli.session_secret, "HACKBOARD_SESSION_SECRET")?;
    let token = SessionToken::issue(user, email, Duration::hours(ttl_hours), Utc::now(), &secret);

    println!("{}", token);
    println!();
    println!("User: {}", token.user_id());
    if let Some(email) = token.email() {
        println!("Email: {}", email);
    }
    println!("Expires in: {}h", ttl_hours);

    Ok(())
}

async fn role(db_config: PostgresConfig, command: &RoleCommands) -> Result<()> {
    let store = PostgresStore::new(db_config).await?;

    match command {
        RoleCommands::Assign {
            user,
            event,
            role,
            email,
        } => {
            let role: EventRole = role.parse()?;

            if let Some(email) = email {
                store
                    .upsert_profile(&UserProfile {
                        uid: user.clone(),
                        email: email.clone(),
                        display_name: None,
                    })
                    .await
                    .context("Failed to record profile")?;
            }

            store
                .upsert_role(user, event, role)
                .await
                .with_context(|| format!("Failed to assign {} in {}", role, event))?;

            println!("Assigned {} to {} in event {}", role, user, event);
        }
        RoleCommands::Show { user } => {
            let roles = store.roles_for_user(user).await?;

            println!("User: {}", user);
            println!("Roles:");
            if roles.is_empty() {
                println!("  (none)");
            } else {
                for row in roles {
                    println!("  {}: {}", row.event_id, row.role);
                }
            }
        }
    }

    Ok(())
}

fn project_link(cli: &Cli, project_id: &str) -> Result<()> {
    let secret = secret(&cli.invite_secret, "HACKBOARD_INVITE_SECRET")?;
    let base_url = cli.base_url.trim_end_matches('/');

    println!(
        "{}/join-project/{}/{}",
        base_url,
        project_id,
        project_invite_hash(project_id, &secret)
    );

    Ok(())
}
