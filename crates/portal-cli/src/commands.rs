//! Command handlers. Each one hydrates the session from durable storage
//! before doing anything else.

use std::io::{self, Write};

use anyhow::{Context, Result};
use portal_core::{ApiClient, Config, SessionStore};
use tracing::{debug, warn};

/// Log in with email and password and persist the returned session
pub async fn login(config: &Config, email: Option<String>) -> Result<()> {
    let mut session = SessionStore::hydrate(config.open_storage()?)
        .context("Failed to load stored session")?;

    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    if email.is_empty() {
        anyhow::bail!("Email required");
    }
    let password = prompt_password()?;
    if password.is_empty() {
        anyhow::bail!("Password required");
    }

    let api = ApiClient::new(config.base_url(), session.storage())?;
    let login = api.login(&email, &password).await.context("Login failed")?;
    session
        .set_session(login.into())
        .context("Failed to store session")?;

    // Persist only the email; flag overrides stay out of the config file
    let mut stored = Config::load().unwrap_or_default();
    stored.last_email = Some(email.clone());
    if let Err(e) = stored.save() {
        warn!(error = %e, "Failed to save config");
    }

    let name = session
        .profile()
        .map(|p| p.display_name())
        .unwrap_or(email);
    println!("Logged in as {}", name);
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    let mut session = SessionStore::hydrate(config.open_storage()?)
        .context("Failed to load stored session")?;
    let was_authenticated = session.is_authenticated();
    session.clear_session().context("Failed to clear session")?;

    if was_authenticated {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    let session = SessionStore::hydrate(config.open_storage()?)
        .context("Failed to load stored session")?;

    println!("Backend: {}", config.base_url());
    println!("Storage: {}", config.storage);
    if session.is_authenticated() {
        match session.profile() {
            Some(profile) => println!("Logged in as {}", profile.display_name()),
            None => println!("Logged in (no stored profile)"),
        }
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub fn whoami(config: &Config) -> Result<()> {
    let session = SessionStore::hydrate(config.open_storage()?)
        .context("Failed to load stored session")?;

    match session.user() {
        Some(user) => println!("{}", serde_json::to_string_pretty(user)?),
        None if session.is_authenticated() => println!("Logged in, but no profile is stored"),
        None => println!("Not logged in"),
    }
    Ok(())
}

/// Authorized GET; 401/403 are reported, the session is left alone
pub async fn get(config: &Config, path: &str) -> Result<()> {
    let session = SessionStore::hydrate(config.open_storage()?)
        .context("Failed to load stored session")?;
    if !session.is_authenticated() {
        warn!("No stored session, sending request without credentials");
    }

    let api = ApiClient::new(config.base_url(), session.storage())?;
    debug!(url = %api.url(path), "GET");
    match api.get_json(path).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) if e.is_auth_failure() => {
            Err(e).context("Request was not authorized; run `portal login` to start a new session")
        }
        Err(e) => Err(e.into()),
    }
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    let email = email.trim();
    if email.is_empty() {
        Ok(last.unwrap_or_default().to_string())
    } else {
        Ok(email.to_string())
    }
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}
