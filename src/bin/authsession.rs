use anyhow::Result;
use authsession::cli::{actions, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    actions::session::handle(action, &globals).await?;

    Ok(())
}
