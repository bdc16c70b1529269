use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 4 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email address")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new("password")
        .short('P')
        .long("password")
        .help("Account password")
        .env("AUTHSESSION_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("authsession")
        .about("Client-side session management for token-based auth APIs")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .help("Auth API base URL, example: https://app.tld")
                .env("AUTHSESSION_API_URL")
                .required(true),
        )
        .arg(
            Arg::new("storage")
                .short('s')
                .long("storage")
                .help("Path of the storage file holding the auth token (default: <config dir>/authsession/storage.json)")
                .env("AUTHSESSION_STORAGE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("AUTHSESSION_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and persist the session token")
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Display name")
                        .required(true),
                )
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(Command::new("logout").about("Forget the persisted session token"))
        .subcommand(Command::new("whoami").about("Show the user of the restored session"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "authsession");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Client-side session management for token-based auth APIs"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
        command.debug_assert();
    }

    #[test]
    fn test_check_login_args() {
        temp_env::with_vars(
            [
                ("AUTHSESSION_PASSWORD", None::<&str>),
                ("AUTHSESSION_STORAGE", None),
            ],
            || {
                let matches = new().get_matches_from(vec![
                    "authsession",
                    "--api-url",
                    "https://app.tld",
                    "login",
                    "--email",
                    "ann@x.com",
                    "--password",
                    "pw",
                ]);

                assert_eq!(
                    matches.get_one::<String>("api-url").map(String::as_str),
                    Some("https://app.tld")
                );
                assert!(matches.get_one::<std::path::PathBuf>("storage").is_none());

                let (name, sub_m) = matches.subcommand().unwrap();
                assert_eq!(name, "login");
                assert_eq!(
                    sub_m.get_one::<String>("email").map(String::as_str),
                    Some("ann@x.com")
                );
                assert_eq!(
                    sub_m.get_one::<String>("password").map(String::as_str),
                    Some("pw")
                );
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("AUTHSESSION_API_URL", Some("https://app.tld")),
                ("AUTHSESSION_STORAGE", Some("/tmp/authsession.json")),
                ("AUTHSESSION_PASSWORD", Some("secret")),
                ("AUTHSESSION_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec![
                    "authsession",
                    "register",
                    "--name",
                    "Ann",
                    "--email",
                    "ann@x.com",
                ]);
                assert_eq!(
                    matches.get_one::<String>("api-url").map(String::as_str),
                    Some("https://app.tld")
                );
                assert_eq!(
                    matches.get_one::<std::path::PathBuf>("storage"),
                    Some(&std::path::PathBuf::from("/tmp/authsession.json"))
                );
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(2));

                let sub_m = matches.subcommand_matches("register").unwrap();
                assert_eq!(
                    sub_m.get_one::<String>("password").map(String::as_str),
                    Some("secret")
                );
            },
        );
    }

    #[test]
    fn test_missing_password_is_an_error() {
        temp_env::with_vars([("AUTHSESSION_PASSWORD", None::<&str>)], || {
            let result = new().try_get_matches_from(vec![
                "authsession",
                "--api-url",
                "https://app.tld",
                "login",
                "--email",
                "ann@x.com",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_numeric_log_level_range() {
        temp_env::with_vars(
            [
                ("AUTHSESSION_LOG_LEVEL", Some("4")),
                ("AUTHSESSION_API_URL", Some("https://app.tld")),
            ],
            || {
                let matches = new().get_matches_from(vec!["authsession", "whoami"]);
                assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(4));
            },
        );

        temp_env::with_vars(
            [
                ("AUTHSESSION_LOG_LEVEL", Some("5")),
                ("AUTHSESSION_API_URL", Some("https://app.tld")),
            ],
            || {
                let result = new().try_get_matches_from(vec!["authsession", "whoami"]);
                assert!(result.is_err());
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("AUTHSESSION_LOG_LEVEL", Some(level)),
                    ("AUTHSESSION_API_URL", Some("https://app.tld")),
                ],
                || {
                    let matches = new().get_matches_from(vec!["authsession", "whoami"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").copied(),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("AUTHSESSION_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "authsession".to_string(),
                    "--api-url".to_string(),
                    "https://app.tld".to_string(),
                    "logout".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }
}
