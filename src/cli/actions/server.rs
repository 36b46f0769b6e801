use crate::{
    api::{self, handlers::auth::AuthConfig},
    cli::commands::{auth, database},
    store::{MemoryStore, MongoStore, Store},
};
use anyhow::{anyhow, Context, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub database: database::Options,
    pub auth: auth::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database cannot be configured or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store: Arc<dyn Store> = if args.database.memory_store {
        warn!("using the in-memory store, data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let uri = mongodb_uri(
            &args.database.uri,
            args.database.user.as_deref(),
            args.database
                .password
                .as_ref()
                .map(|password| password.expose_secret()),
        )?;

        let store = MongoStore::connect(&uri, &args.database.database)
            .await
            .context("Could not configure the MongoDB client")?;

        // The driver connects lazily, an unreachable server is not fatal here
        match store.ping().await {
            Ok(()) => info!("Pinged your deployment. You successfully connected to MongoDB!"),
            Err(err) => warn!("MongoDB ping failed: {err}"),
        }

        Arc::new(store)
    };

    let auth_config = AuthConfig::new(args.auth.access_token_secret)
        .with_token_ttl_days(args.auth.token_ttl_days)
        .with_cookie_max_age_days(args.auth.cookie_max_age_days)
        .with_production(args.auth.production)
        .with_public_post_creation(args.auth.public_post_creation)
        .with_public_organizer_posts(args.auth.public_organizer_posts);

    api::new(args.port, &args.cors_origins, store, auth_config).await
}

/// Inject the database credentials into the connection string.
///
/// # Errors
/// Returns an error if the URI cannot be parsed or has no host to attach credentials to.
pub fn mongodb_uri(base: &str, user: Option<&str>, password: Option<&str>) -> Result<String> {
    if user.is_none() && password.is_none() {
        return Ok(base.to_string());
    }

    let mut uri = Url::parse(base).context("invalid MongoDB connection string")?;

    if let Some(user) = user {
        uri.set_username(user)
            .map_err(|()| anyhow!("Error setting username"))?;
    }

    if let Some(password) = password {
        uri.set_password(Some(password))
            .map_err(|()| anyhow!("Error setting password"))?;
    }

    Ok(uri.to_string())
}

fn log_startup_args(args: &Args) {
    let backend = if args.database.memory_store {
        "memory".to_string()
    } else {
        redact_uri(&args.database.uri)
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("store", backend),
        ("database", args.database.database.clone()),
        ("db_user_set", args.database.user.is_some().to_string()),
        ("cors_origins", args.cors_origins.join(",")),
        ("production", args.auth.production.to_string()),
        ("token_ttl_days", args.auth.token_ttl_days.to_string()),
        (
            "public_post_creation",
            args.auth.public_post_creation.to_string(),
        ),
        (
            "public_organizer_posts",
            args.auth.public_organizer_posts.to_string(),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_uri(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-uri".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
