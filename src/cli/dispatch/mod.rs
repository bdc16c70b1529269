use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::FileTokenStore;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let globals = globals(matches)?;

    let action = match matches.subcommand() {
        Some(("login", sub_m)) => Action::Login {
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
        },
        Some(("register", sub_m)) => Action::Register {
            name: required(sub_m, "name")?,
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
        },
        Some(("logout", _)) => Action::Logout,
        Some(("whoami", _)) => Action::Whoami,
        _ => return Err(anyhow!("missing subcommand")),
    };

    Ok((action, globals))
}

fn globals(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let api_url = required(matches, "api-url")?;

    let storage_path = match matches.get_one::<PathBuf>("storage") {
        Some(path) => path.clone(),
        None => FileTokenStore::default_path()
            .context("no config directory available, pass --storage")?,
    };

    Ok(GlobalArgs::new(api_url, storage_path))
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}
