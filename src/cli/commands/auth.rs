use anyhow::{Context, Result};
use clap::{builder::FalseyValueParser, Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ACCESS_TOKEN_SECRET: &str = "access-token-secret";
pub const ARG_ENVIRONMENT: &str = "environment";
pub const ARG_TOKEN_TTL_DAYS: &str = "token-ttl-days";
pub const ARG_COOKIE_MAX_AGE_DAYS: &str = "cookie-max-age-days";
pub const ARG_PUBLIC_POST_CREATION: &str = "public-post-creation";
pub const ARG_PUBLIC_ORGANIZER_POSTS: &str = "public-organizer-posts";

#[derive(Debug)]
pub struct Options {
    pub access_token_secret: SecretString,
    pub production: bool,
    pub token_ttl_days: u32,
    pub cookie_max_age_days: u32,
    pub public_post_creation: bool,
    pub public_organizer_posts: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if the signing secret is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let access_token_secret = matches
            .get_one::<String>(ARG_ACCESS_TOKEN_SECRET)
            .map(|secret| SecretString::from(secret.clone()))
            .context("missing required argument: --access-token-secret")?;

        let production = matches
            .get_one::<String>(ARG_ENVIRONMENT)
            .is_some_and(|environment| environment == "production");

        Ok(Self {
            access_token_secret,
            production,
            token_ttl_days: matches
                .get_one::<u32>(ARG_TOKEN_TTL_DAYS)
                .copied()
                .unwrap_or(10),
            cookie_max_age_days: matches
                .get_one::<u32>(ARG_COOKIE_MAX_AGE_DAYS)
                .copied()
                .unwrap_or(365),
            public_post_creation: matches.get_flag(ARG_PUBLIC_POST_CREATION),
            public_organizer_posts: matches.get_flag(ARG_PUBLIC_ORGANIZER_POSTS),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_route_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_SECRET)
                .long(ARG_ACCESS_TOKEN_SECRET)
                .help("HS256 secret used to sign session tokens")
                .env("ACCESS_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ENVIRONMENT)
                .long(ARG_ENVIRONMENT)
                .help("Deployment environment; production issues SameSite=None; Secure cookies")
                .env("NODE_ENV")
                .default_value("development"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_DAYS)
                .long(ARG_TOKEN_TTL_DAYS)
                .help("Session token lifetime in days")
                .env("TOKEN_TTL_DAYS")
                .default_value("10")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE_DAYS)
                .long(ARG_COOKIE_MAX_AGE_DAYS)
                .help("Session cookie Max-Age in days")
                .env("COOKIE_MAX_AGE_DAYS")
                .default_value("365")
                .value_parser(clap::value_parser!(u32)),
        )
}

fn with_route_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PUBLIC_POST_CREATION)
                .long(ARG_PUBLIC_POST_CREATION)
                .help("Allow POST /posts without a session")
                .env("PUBLIC_POST_CREATION")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(ARG_PUBLIC_ORGANIZER_POSTS)
                .long(ARG_PUBLIC_ORGANIZER_POSTS)
                .help("Allow GET /posts/:email without a session")
                .env("PUBLIC_ORGANIZER_POSTS")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
}
