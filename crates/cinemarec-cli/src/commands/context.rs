use cinemarec_config::{Config, CredentialStore, PathManager};
use cinemarec_core::{GuardOutcome, Route, Session, SessionGuard, ViewError};
use cinemarec_services::Services;
use color_eyre::eyre::eyre;
use color_eyre::{Report, Result};

/// Configuration, stored credentials and paths shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let credentials_file = paths.credentials_file();
        let mut credentials = CredentialStore::new(credentials_file.clone());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;

        Ok(Self {
            paths,
            config,
            credentials,
        })
    }

    /// Service clients authenticated as `session`
    pub fn services(&self, session: Option<&Session>) -> Result<Services> {
        Services::from_config(&self.config, &self.credentials, session.map(|s| s.token().to_string()))
            .map_err(|e| eyre!("{}", e))
    }

    /// Pass the session guard for `route`. A missing or expired session is purged and the
    /// route remembered for after login.
    pub fn require_session(&mut self, route: &Route) -> Result<Session> {
        match SessionGuard::new(&mut self.credentials).check(route)? {
            GuardOutcome::Granted(session) => Ok(session),
            GuardOutcome::RedirectToLogin | GuardOutcome::Public => Err(eyre!(
                "Not signed in. Run `cinemarec login` and you will continue to {}",
                route
            )),
            GuardOutcome::RedirectHome => Err(eyre!("Your account cannot open {}", route)),
        }
    }

    /// Report a view error. A session the server rejected is purged first.
    pub fn fail(&mut self, err: ViewError, route: &Route) -> Report {
        if err.is_auth() {
            if let Err(e) = SessionGuard::new(&mut self.credentials).expire(route) {
                tracing::warn!("Could not clear rejected session: {}", e);
            }
            return eyre!("Session expired. Run `cinemarec login` to sign in again");
        }
        eyre!(err)
    }

    /// Like [`AppContext::fail`] for a report that may wrap a view error
    pub fn recover(&mut self, report: Report, route: &Route) -> Report {
        match report.downcast::<ViewError>() {
            Ok(err) => self.fail(err, route),
            Err(report) => report,
        }
    }
}
