use crate::cli::{
    actions::{server::Args, Action},
    commands::{auth, database, ARG_CORS_ORIGIN, ARG_PORT},
};
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);
    let cors_origins = matches
        .get_many::<String>(ARG_CORS_ORIGIN)
        .map(|origins| origins.cloned().collect())
        .unwrap_or_default();

    Ok(Action::Server(Args {
        port,
        cors_origins,
        database: database::Options::parse(matches)?,
        auth: auth::Options::parse(matches)?,
    }))
}
