pub mod auth;
pub mod database;
pub mod logging;

use crate::api::DEFAULT_CORS_ORIGINS;
use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_CORS_ORIGIN: &str = "cors-origin";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("volunteers")
        .about("Volunteer management API")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("5000")
                .env("PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_CORS_ORIGIN)
                .long(ARG_CORS_ORIGIN)
                .help("Front-end origin allowed to call the API with credentials (repeatable)")
                .env("CORS_ORIGINS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_values(DEFAULT_CORS_ORIGINS),
        );

    let command = database::with_args(command);
    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "volunteers");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Volunteer management API".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_port_and_origins() {
        temp_env::with_vars_unset(["PORT", "CORS_ORIGINS"], || {
            let matches = new().get_matches_from(vec![
                "volunteers",
                "--port",
                "8080",
                "--access-token-secret",
                "s3cret",
                "--cors-origin",
                "http://localhost:3000,https://volunteers.dev",
                "--cors-origin",
                "https://admin.volunteers.dev",
            ]);

            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
            let origins: Vec<&String> = matches
                .get_many::<String>(ARG_CORS_ORIGIN)
                .map(Iterator::collect)
                .unwrap_or_default();
            assert_eq!(
                origins,
                vec![
                    "http://localhost:3000",
                    "https://volunteers.dev",
                    "https://admin.volunteers.dev"
                ]
            );
        });
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("PORT", None),
                ("CORS_ORIGINS", None),
                ("ACCESS_TOKEN_SECRET", Some("s3cret")),
            ],
            || {
                let matches = new().get_matches_from(vec!["volunteers"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(5000));
                assert_eq!(
                    matches
                        .get_many::<String>(ARG_CORS_ORIGIN)
                        .map(Iterator::count),
                    Some(DEFAULT_CORS_ORIGINS.len())
                );
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("PORT", Some("443")),
                ("ACCESS_TOKEN_SECRET", Some("s3cret")),
                ("CORS_ORIGINS", Some("https://a.dev,https://b.dev")),
                ("LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["volunteers"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));
                assert_eq!(
                    matches
                        .get_many::<String>(ARG_CORS_ORIGIN)
                        .map(Iterator::count),
                    Some(2)
                );
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }
}
