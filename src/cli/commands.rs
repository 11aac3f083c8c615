//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hackboard")]
#[command(about = "Hackathon event backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Secret that signs session tokens
    #[arg(long, env = "HACKBOARD_SESSION_SECRET", global = true, hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Secret that signs event invites and project invite links
    #[arg(long, env = "HACKBOARD_INVITE_SECRET", global = true, hide_env_values = true)]
    pub invite_secret: Option<String>,

    /// Public origin used to build links
    #[arg(long, env = "HACKBOARD_BASE_URL", global = true, default_value = "http://localhost:3000")]
    pub base_url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to
        #[arg(short, long, env = "HACKBOARD_BIND", default_value = "0.0.0.0:8080")]
        bind: String,

        /// Comma separated user ids treated as global admins
        #[arg(long, env = "HACKBOARD_ADMIN_IDS", default_value = "")]
        admin_ids: String,

        /// Use the in-memory store instead of Postgres
        #[arg(long)]
        memory: bool,

        /// JSON file of events, profiles and roles to load before serving
        #[arg(long, env = "HACKBOARD_SEED")]
        seed: Option<PathBuf>,
    },

    /// Initialize the database schema
    Init,

    /// Issue a session token
    ///
    /// Examples:
    ///   hackboard session --user u_123 --email ada@example.com
    ///   hackboard session --user u_123 --ttl-hours 1
    Session {
        /// User id the token is issued for
        #[arg(long, required = true)]
        user: String,

        /// Email carried in the token
        #[arg(long)]
        email: Option<String>,

        /// Lifetime in hours
        #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(i64).range(1..))]
        ttl_hours: i64,
    },

    /// Manage event roles
    Role {
        #[command(subcommand)]
        command: RoleCommands,
    },

    /// Print the team invite link for a project
    ProjectLink {
        /// Project id
        project_id: String,
    },
}

#[derive(Subcommand)]
pub enum RoleCommands {
    /// Assign a role in an event, replacing any existing one
    ///
    /// Examples:
    ///   hackboard role assign --user u_123 --event e_1 --role organizer
    Assign {
        #[arg(long, required = true)]
        user: String,

        #[arg(long, required = true)]
        event: String,

        /// participant, mentor, judge, organizer or admin
        #[arg(long, value_parser = parse_event_role, required = true)]
        role: String,

        /// Also record the user's profile with this email
        #[arg(long)]
        email: Option<String>,
    },

    /// Show a user's roles across events
    Show {
        #[arg(long, required = true)]
        user: String,
    },
}

fn parse_event_role(s: &str) -> Result<String, String> {
    let lowered = s.to_lowercase();
    match hackboard::EventRole::parse(&lowered) {
        Some(_) => Ok(lowered),
        None => Err(format!(
            "Invalid role: {}. Must be participant, mentor, judge, organizer, or admin",
            s
        )),
    }
}
