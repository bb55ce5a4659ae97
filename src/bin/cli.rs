use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use catalog_gate::app;
use catalog_gate::authz::{AuthorizationGuard, Permission, Resource, Scope};
use catalog_gate::config::ProviderConfig;
use catalog_gate::provider::{AuthorizationProvider, IdentityProvider, KeycloakClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "catalog-gate provider tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exchange a username/password for a token and print the provider response
    Login { identifier: String, password: String },
    /// Ask the provider whether a token holds `resource#scope`
    Check {
        token: String,
        resource: Resource,
        scope: Scope,
    },
    /// Print every route with the permission the guard will require
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Try to load env from CWD; fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();
    let config = ProviderConfig::from_env()?;
    let client = Arc::new(KeycloakClient::new(config).context("failed to build provider client")?);

    match cli.command {
        Commands::Login { identifier, password } => {
            let token = client
                .exchange_password(&identifier, &password)
                .await
                .context("credential exchange failed")?;
            println!("{}", serde_json::to_string_pretty(&token)?);
        }
        Commands::Check { token, resource, scope } => {
            let permission = Permission { resource, scope };
            let allowed = client
                .evaluate(&token, &permission.query())
                .await
                .with_context(|| format!("provider query for {permission} failed"))?;
            println!("{:<20} {}", permission, if allowed { "allow" } else { "deny" });
        }
        Commands::Routes => {
            let (_, table) = app::routes(AuthorizationGuard::new(client));
            println!("{:<7} {:<24} {}", "Method", "Path", "Permission");
            for entry in table {
                println!("{}", entry);
            }
        }
    }

    Ok(())
}
