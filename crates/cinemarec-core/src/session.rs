//! Session context, route guard and sign-in flows.
//!
//! The session token is a signed JWT issued by the identity service. The client never
//! verifies the signature; it only reads the payload to learn who is signed in, with which
//! role, and until when. Expiry is terminal: there is no refresh flow.

use crate::error::{ViewError, ViewResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use cinemarec_config::CredentialStore;
use cinemarec_models::{Role, SessionClaims};
use cinemarec_services::AuthApi;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The signed-in user, passed explicitly to every view-model call
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    claims: SessionClaims,
}

impl Session {
    /// Decode `token` and accept it only if it has not expired at `now`
    pub fn from_token(token: &str, now: DateTime<Utc>) -> ViewResult<Self> {
        let claims = decode_claims(token)?;
        if claims.is_expired_at(now) {
            return Err(ViewError::Auth("session has expired".to_string()));
        }
        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn email(&self) -> &str {
        self.claims.email()
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.expires_at()
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(token: &str) -> ViewResult<T> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(ViewError::Auth("token is not a JWT".to_string())),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ViewError::Auth(format!("token payload is not base64: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| ViewError::Auth(format!("token payload is unreadable: {}", e)))
}

/// Read the claims of a session token without verifying its signature
pub fn decode_claims(token: &str) -> ViewResult<SessionClaims> {
    decode_segment(token)
}

#[derive(Debug, Deserialize)]
struct GoogleIdentity {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Email and display name from a Google ID token credential
pub fn google_identity(credential: &str) -> ViewResult<(String, String)> {
    let identity: GoogleIdentity = decode_segment(credential)?;
    let name = identity.name.unwrap_or_else(|| identity.email.clone());
    Ok((identity.email, name))
}

/// Loose email shape check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < domain.len() - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Recommendations,
    Statistics,
    Reviews,
    Quizzes,
    Preferences,
}

impl DashboardTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardTab::Recommendations => "recommendations",
            DashboardTab::Statistics => "statistics",
            DashboardTab::Reviews => "reviews",
            DashboardTab::Quizzes => "quizzes",
            DashboardTab::Preferences => "preferences",
        }
    }

    fn parse(tab: &str) -> Option<Self> {
        match tab {
            "recommendations" => Some(DashboardTab::Recommendations),
            "statistics" => Some(DashboardTab::Statistics),
            "reviews" => Some(DashboardTab::Reviews),
            "quizzes" => Some(DashboardTab::Quizzes),
            "preferences" => Some(DashboardTab::Preferences),
            _ => None,
        }
    }
}

/// Client-side navigation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard(DashboardTab),
    AdminDashboard,
    Watch { movie_id: u64, email: Option<String> },
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let (path, query) = path.trim().split_once('?').unwrap_or((path.trim(), ""));
        let param = |key: &str| {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        };

        let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Route::Home),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["dashboard"] => {
                let tab = param("tab")
                    .and_then(|t| DashboardTab::parse(&t))
                    .unwrap_or(DashboardTab::Recommendations);
                Some(Route::Dashboard(tab))
            }
            ["admin", "dashboard"] => Some(Route::AdminDashboard),
            ["watch", id] => Some(Route::Watch {
                movie_id: id.parse().ok()?,
                email: param("email").filter(|e| !e.is_empty()),
            }),
            _ => None,
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Home | Route::Login | Route::Register)
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::AdminDashboard => Some(Role::Admin),
            _ => None,
        }
    }

    /// Where a freshly signed-in user goes when no return route is pending
    pub fn landing_for(role: Role) -> Self {
        match role {
            Role::Admin => Route::AdminDashboard,
            _ => Route::Dashboard(DashboardTab::Recommendations),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Dashboard(tab) => write!(f, "/dashboard?tab={}", tab.as_str()),
            Route::AdminDashboard => write!(f, "/admin/dashboard"),
            Route::Watch { movie_id, email } => match email {
                Some(email) => write!(f, "/watch/{}?email={}", movie_id, email),
                None => write!(f, "/watch/{}", movie_id),
            },
        }
    }
}

/// Where the cached credential and the pending return route live
pub trait SessionStore {
    fn token(&self) -> Option<String>;
    fn store_token(&mut self, token: &str) -> ViewResult<()>;
    fn clear_token(&mut self) -> ViewResult<()>;
    fn remember_route(&mut self, route: &Route) -> ViewResult<()>;
    /// Return the pending route once, then forget it
    fn take_route(&mut self) -> ViewResult<Option<Route>>;
}

fn persist(store: &CredentialStore) -> ViewResult<()> {
    store
        .save()
        .map_err(|e| ViewError::Service(format!("Failed to save credentials: {}", e)))
}

impl SessionStore for CredentialStore {
    fn token(&self) -> Option<String> {
        self.get_session_token().cloned()
    }

    fn store_token(&mut self, token: &str) -> ViewResult<()> {
        self.set_session_token(token.to_string());
        persist(self)
    }

    fn clear_token(&mut self) -> ViewResult<()> {
        self.clear_session();
        persist(self)
    }

    fn remember_route(&mut self, route: &Route) -> ViewResult<()> {
        self.set_return_to(route.to_string());
        persist(self)
    }

    fn take_route(&mut self) -> ViewResult<Option<Route>> {
        let route = self.take_return_to();
        if route.is_some() {
            persist(self)?;
        }
        Ok(route.as_deref().and_then(Route::parse))
    }
}

/// In-process store for embedding and tests
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    token: Option<String>,
    route: Option<Route>,
}

impl MemorySessionStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            route: None,
        }
    }

    pub fn pending_route(&self) -> Option<&Route> {
        self.route.as_ref()
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }

    fn store_token(&mut self, token: &str) -> ViewResult<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&mut self) -> ViewResult<()> {
        self.token = None;
        Ok(())
    }

    fn remember_route(&mut self, route: &Route) -> ViewResult<()> {
        self.route = Some(route.clone());
        Ok(())
    }

    fn take_route(&mut self) -> ViewResult<Option<Route>> {
        Ok(self.route.take())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// A valid session exists and may open the route
    Granted(Session),
    /// Route needs no session and none is active
    Public,
    /// No usable credential; the requested route was remembered
    RedirectToLogin,
    /// Signed in, but with the wrong role for the route
    RedirectHome,
}

/// Gatekeeper consulted before a protected screen opens
pub struct SessionGuard<'a, S: SessionStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: SessionStore + ?Sized> SessionGuard<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn check(&mut self, requested: &Route) -> ViewResult<GuardOutcome> {
        self.check_at(requested, Utc::now())
    }

    pub fn check_at(&mut self, requested: &Route, now: DateTime<Utc>) -> ViewResult<GuardOutcome> {
        let Some(token) = self.store.token() else {
            if !requested.requires_session() {
                return Ok(GuardOutcome::Public);
            }
            debug!("No session for {}, redirecting to login", requested);
            self.store.remember_route(requested)?;
            return Ok(GuardOutcome::RedirectToLogin);
        };

        let session = match Session::from_token(&token, now) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding cached session: {}", e);
                self.store.clear_token()?;
                if !requested.requires_session() {
                    return Ok(GuardOutcome::Public);
                }
                self.store.remember_route(requested)?;
                return Ok(GuardOutcome::RedirectToLogin);
            }
        };

        if let Some(role) = requested.required_role() {
            if session.role() != role {
                debug!("{} needs role {}, session has {}", requested, role.label(), session.role().label());
                return Ok(GuardOutcome::RedirectHome);
            }
        }
        Ok(GuardOutcome::Granted(session))
    }

    /// The current session if one is valid, without touching storage
    pub fn current(&self) -> Option<Session> {
        self.store
            .token()
            .and_then(|token| Session::from_token(&token, Utc::now()).ok())
    }

    /// Purge the credential after the backend rejected it mid-screen
    pub fn expire(&mut self, requested: &Route) -> ViewResult<()> {
        info!("Session rejected by the server, signing out");
        self.store.clear_token()?;
        self.store.remember_route(requested)
    }
}

/// A completed sign-in and where to go next
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub session: Session,
    pub landing: Route,
}

/// Login, registration, Google sign-in and logout
pub struct Authenticator {
    auth: Arc<dyn AuthApi>,
}

impl Authenticator {
    pub fn new(auth: Arc<dyn AuthApi>) -> Self {
        Self { auth }
    }

    fn check_credentials(email: &str, password: &str) -> ViewResult<()> {
        if !is_valid_email(email) {
            return Err(ViewError::validation("Please enter a valid email address"));
        }
        if password.is_empty() {
            return Err(ViewError::validation("Password is required"));
        }
        Ok(())
    }

    pub async fn login(&self, store: &mut dyn SessionStore, email: &str, password: &str) -> ViewResult<SignedIn> {
        Self::check_credentials(email, password)?;
        let token = self.auth.login(email, password).await?;
        Self::accept(store, token)
    }

    pub async fn register(&self, store: &mut dyn SessionStore, email: &str, password: &str) -> ViewResult<SignedIn> {
        Self::check_credentials(email, password)?;
        let token = self.auth.register(email, password).await?;
        Self::accept(store, token)
    }

    /// Sign in with a Google ID token credential
    pub async fn google_login(&self, store: &mut dyn SessionStore, credential: &str) -> ViewResult<SignedIn> {
        let (email, name) = google_identity(credential)?;
        let token = self.auth.google_login(&email, &name).await?;
        Self::accept(store, token)
    }

    pub fn logout(store: &mut dyn SessionStore) -> ViewResult<()> {
        store.clear_token()?;
        info!("Signed out");
        Ok(())
    }

    fn accept(store: &mut dyn SessionStore, token: String) -> ViewResult<SignedIn> {
        let session = Session::from_token(&token, Utc::now())?;
        store.store_token(&token)?;
        let landing = store
            .take_route()?
            .unwrap_or_else(|| Route::landing_for(session.role()));
        info!("Signed in as {} ({})", session.email(), session.role().label());
        Ok(SignedIn { session, landing })
    }
}
