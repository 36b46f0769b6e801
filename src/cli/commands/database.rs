use anyhow::{Context, Result};
use clap::{builder::FalseyValueParser, Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_MONGODB_URI: &str = "mongodb-uri";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASS: &str = "db-pass";
pub const ARG_DATABASE: &str = "database";
pub const ARG_MEMORY_STORE: &str = "memory-store";

#[derive(Debug)]
pub struct Options {
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub database: String,
    pub memory_store: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if a defaulted argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            uri: matches
                .get_one::<String>(ARG_MONGODB_URI)
                .cloned()
                .context("missing required argument: --mongodb-uri")?,
            user: matches.get_one::<String>(ARG_DB_USER).cloned(),
            password: matches
                .get_one::<String>(ARG_DB_PASS)
                .map(|password| SecretString::from(password.clone())),
            database: matches
                .get_one::<String>(ARG_DATABASE)
                .cloned()
                .context("missing required argument: --database")?,
            memory_store: matches.get_flag(ARG_MEMORY_STORE),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MONGODB_URI)
                .long(ARG_MONGODB_URI)
                .help("MongoDB connection string")
                .long_help(
                    "MongoDB connection string. --db-user/--db-pass are injected into it, so they are not required in the URI.",
                )
                .env("MONGODB_URI")
                .default_value("mongodb://localhost:27017"),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .help("MongoDB username")
                .env("DB_USER"),
        )
        .arg(
            Arg::new(ARG_DB_PASS)
                .long(ARG_DB_PASS)
                .help("MongoDB password")
                .env("DB_PASS")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DATABASE)
                .long(ARG_DATABASE)
                .help("Database holding the posts and applications collections")
                .env("DB_NAME")
                .default_value("volunteers"),
        )
        .arg(
            Arg::new(ARG_MEMORY_STORE)
                .long(ARG_MEMORY_STORE)
                .help("Keep data in memory instead of MongoDB (lost on exit)")
                .env("MEMORY_STORE")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
}
