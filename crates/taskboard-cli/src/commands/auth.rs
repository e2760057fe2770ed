//! Authentication commands.

use super::prompt;
use crate::output::{self, OutputFormat};
use anyhow::{bail, ensure, Result};
use taskboard_auth::{SessionManager, SessionState};

/// Login with email and password.
pub async fn login(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    if let SessionState::Authenticated(user) = manager.state() {
        output::print_success(&format!("Already logged in as {}", user.email), format);
        return Ok(());
    }

    let email = prompt("Email: ")?;
    check_email(&email)?;

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    check_password(&password, None)?;

    let user = manager.login(&email, &password).await?;
    output::print_success(&format!("Logged in as {}", user.email), format);
    Ok(())
}

/// Create an account and log in.
pub async fn register(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    if let SessionState::Authenticated(user) = manager.state() {
        bail!("Already logged in as {}. Log out first", user.email);
    }

    let name = prompt("Name: ")?;
    let email = prompt("Email: ")?;
    check_email(&email)?;

    let password = rpassword::prompt_password("Password: ")?;
    check_password(&password, None)?;
    let confirmation = rpassword::prompt_password("Confirm password: ")?;
    check_password(&password, Some(&confirmation))?;

    let user = manager.register(&email, &password, &name).await?;
    output::print_success(&format!("Account created. Logged in as {}", user.email), format);
    Ok(())
}

fn check_email(email: &str) -> Result<()> {
    ensure!(!email.is_empty(), "Email is required");
    Ok(())
}

fn check_password(password: &str, confirmation: Option<&str>) -> Result<()> {
    ensure!(!password.is_empty(), "Password is required");
    if let Some(confirmation) = confirmation {
        ensure!(confirmation == password, "Passwords do not match");
    }
    Ok(())
}

/// Logout and clear session.
pub fn logout(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    manager.logout();
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Show the current session.
pub fn status(manager: &SessionManager, format: &OutputFormat) -> Result<()> {
    let state = manager.state();

    match format {
        OutputFormat::Text => match &state {
            SessionState::Authenticated(user) => {
                println!("Auth:     logged in");
                println!("User ID:  {}", user.id);
                println!("Name:     {}", user.name);
                println!("Email:    {}", user.email);
            }
            _ => println!("Auth:     not logged in"),
        },
        OutputFormat::Json => output::print_json(&state)?,
    }

    Ok(())
}
