use anyhow::Context;
use clap::{Parser, Subcommand};

use shelf_app::{
    build_registry, migrate,
    modules::users::{models::CreateUser, UserService},
    Stores,
};
use shelf_authz::{JwtKeys, PasswordHasher, Role};
use shelf_kernel::settings::Settings;

/// Operator tooling for a Shelf deployment
#[derive(Debug, Parser)]
#[command(name = "shelf-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the indexes declared by every module
    Migrate,

    /// Create a user with the admin role
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SHELF_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Load and validate the configuration, then print a summary
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load Shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Migrate => {
            let stores = Stores::connect(&settings.database).await?;
            let registry = build_registry(&settings, &stores);
            migrate(&registry, &stores).await?;
            println!("migrations applied");
        }
        Command::CreateAdmin {
            username,
            email,
            password,
        } => {
            let stores = Stores::connect(&settings.database).await?;
            let service = UserService::new(
                stores.users.clone(),
                PasswordHasher::new(settings.auth.bcrypt_cost),
                std::sync::Arc::new(JwtKeys::from_settings(&settings.auth)),
            );
            let admin = service
                .create(CreateUser {
                    username,
                    email,
                    password,
                    role: Some(Role::Admin),
                })
                .await
                .context("failed to create admin")?;
            tracing::info!(admin = %admin.email, id = %admin.id, "admin account created");
            println!("created admin {} ({})", admin.email, admin.id);
        }
        Command::CheckConfig => print_summary(&settings),
    }

    Ok(())
}

fn print_summary(settings: &Settings) {
    println!("environment: {}", settings.environment.as_str());
    println!(
        "server: {}:{} (timeout {} ms)",
        settings.server.host, settings.server.port, settings.server.request_timeout_ms
    );
    println!(
        "database: {:?} {} / {}",
        settings.database.backend, settings.database.uri, settings.database.name
    );
    println!(
        "auth: token ttl {} min, bcrypt cost {}",
        settings.auth.token_ttl_minutes, settings.auth.bcrypt_cost
    );
    println!("configuration ok");
}
