use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::{AuthApi, FileTokenStore, HttpAuthApi, SessionManager, TokenStore, User};
use anyhow::Result;
use tracing::debug;

/// Handle the session actions
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let api = HttpAuthApi::new(&globals.api_url)?;
    let store = FileTokenStore::new(&globals.storage_path);

    debug!("storage: {}", globals.storage_path.display());

    let session = SessionManager::initialize(store, api).await;

    println!("{}", run(action, &session).await?);

    Ok(())
}

/// Applies `action` to an initialized session and returns the text to show.
pub async fn run<S: TokenStore, A: AuthApi>(
    action: Action,
    session: &SessionManager<S, A>,
) -> Result<String> {
    match action {
        Action::Login { email, password } => {
            session.login(&email, &password).await?;
            Ok(signed_in(session.user().as_ref()))
        }
        Action::Register {
            name,
            email,
            password,
        } => {
            session.register(&name, &email, &password).await?;
            Ok(signed_in(session.user().as_ref()))
        }
        Action::Logout => {
            session.logout();
            Ok("Logged out".to_string())
        }
        Action::Whoami => Ok(describe(session.user().as_ref())),
    }
}

fn signed_in(user: Option<&User>) -> String {
    match user {
        Some(user) => format!("Logged in as {} <{}>", user.name, user.email),
        None => "Not logged in".to_string(),
    }
}

fn describe(user: Option<&User>) -> String {
    match user {
        Some(user) => {
            let subscription = user
                .subscription
                .map_or_else(|| "none".to_string(), |subscription| subscription.to_string());
            format!(
                "{} <{}>\nid: {}\nrole: {}\nsubscription: {}",
                user.name, user.email, user.id, user.role, subscription
            )
        }
        None => "Not logged in".to_string(),
    }
}
