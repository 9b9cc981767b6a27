use super::context::AppContext;
use super::prompts;
use crate::output::Output;
use chrono::Utc;
use cinemarec_core::{Authenticator, GuardOutcome, Route, SessionGuard, SignedIn};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;

fn report_signed_in(signed_in: &SignedIn, output: &Output) {
    let session = &signed_in.session;
    match output.format() {
        crate::output::OutputFormat::Human => {
            output.success(format!("Signed in as {} ({})", session.email(), session.role().label()));
            output.info(format!("Continue to {}", signed_in.landing));
        }
        _ => output.json(&json!({
            "email": session.email(),
            "role": session.role().label(),
            "expiresAt": session.expires_at().map(|t| t.to_rfc3339()),
            "landing": signed_in.landing.to_string(),
        })),
    }
}

fn read_credentials(email: Option<String>) -> Result<(String, String)> {
    let email = match email {
        Some(email) => email,
        None => prompts::prompt_required("Email", None)?,
    };
    let password = prompts::prompt_password("Password")?;
    Ok((email, password))
}

pub async fn run_login(email: Option<String>, output: &Output) -> Result<()> {
    let mut ctx = AppContext::load()?;
    let (email, password) = read_credentials(email)?;
    let services = ctx.services(None)?;

    let signed_in = Authenticator::new(services.auth)
        .login(&mut ctx.credentials, &email, &password)
        .await?;
    report_signed_in(&signed_in, output);
    Ok(())
}

pub async fn run_register(email: Option<String>, output: &Output) -> Result<()> {
    let mut ctx = AppContext::load()?;
    let (email, password) = read_credentials(email)?;
    let confirm = prompts::prompt_password("Confirm password")?;
    if confirm != password {
        return Err(eyre!("Passwords do not match"));
    }
    let services = ctx.services(None)?;

    let signed_in = Authenticator::new(services.auth)
        .register(&mut ctx.credentials, &email, &password)
        .await?;
    report_signed_in(&signed_in, output);
    Ok(())
}

pub async fn run_google_login(credential: Option<String>, output: &Output) -> Result<()> {
    let mut ctx = AppContext::load()?;
    let credential = match credential {
        Some(credential) => credential,
        None => prompts::prompt_required("Google credential", None)?,
    };
    let services = ctx.services(None)?;

    let signed_in = Authenticator::new(services.auth)
        .google_login(&mut ctx.credentials, credential.trim())
        .await?;
    report_signed_in(&signed_in, output);
    Ok(())
}

pub fn run_logout(output: &Output) -> Result<()> {
    let mut ctx = AppContext::load()?;
    Authenticator::logout(&mut ctx.credentials)?;
    output.success("Signed out");
    Ok(())
}

pub fn run_whoami(output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let mut credentials = ctx.credentials;
    let Some(session) = SessionGuard::new(&mut credentials).current() else {
        output.warn("Not signed in");
        return Ok(());
    };

    let remaining = session
        .expires_at()
        .map(|at| at - Utc::now())
        .map(|d| format!("{}h {}m", d.num_hours(), d.num_minutes() % 60));
    match output.format() {
        crate::output::OutputFormat::Human => {
            output.info(format!("Signed in as {} ({})", session.email(), session.role().label()));
            if let Some(remaining) = remaining {
                output.info(format!("Session expires in {}", remaining));
            }
        }
        _ => output.json(&json!({
            "email": session.email(),
            "role": session.role().label(),
            "expiresAt": session.expires_at().map(|t| t.to_rfc3339()),
        })),
    }
    Ok(())
}

/// Resolve a route the way navigation would: through the session guard
pub fn run_open(route: &str, output: &Output) -> Result<()> {
    let route = Route::parse(route).ok_or_else(|| eyre!("Unknown route: {}", route))?;
    let mut ctx = AppContext::load()?;

    let (outcome, destination) = match SessionGuard::new(&mut ctx.credentials).check(&route)? {
        GuardOutcome::Granted(session) => (format!("open as {}", session.email()), route.clone()),
        GuardOutcome::Public => ("open".to_string(), route.clone()),
        GuardOutcome::RedirectToLogin => ("sign in first".to_string(), Route::Login),
        GuardOutcome::RedirectHome => ("not permitted".to_string(), Route::Home),
    };

    match output.format() {
        crate::output::OutputFormat::Human => {
            if destination == route {
                output.success(format!("{}: {}", route, outcome));
            } else {
                output.warn(format!("{}: {}, redirecting to {}", route, outcome, destination));
            }
        }
        _ => output.json(&json!({
            "requested": route.to_string(),
            "destination": destination.to_string(),
            "outcome": outcome,
        })),
    }
    Ok(())
}
