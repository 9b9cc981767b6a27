//! Builds the service clients from configuration.
//!
//! The catalog has two interchangeable providers selected by `[catalog].provider`; each is
//! built by a registered factory. The other services have a single implementation.

use crate::catalog::{ProxyCatalogClient, TmdbCatalogClient};
use crate::http::build_client;
use crate::traits::{AuthApi, CatalogApi, PreferencesApi, QuizzesApi, RecommendationsApi, ReviewsApi, StatisticsApi};
use crate::{AuthClient, QuizzesClient, ReviewsClient, StatisticsClient, UsersClient};
use anyhow::Result;
use cinemarec_config::{CatalogProvider, Config, CredentialStore};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Factory for one catalog provider
pub trait CatalogFactory: Send + Sync {
    fn provider(&self) -> CatalogProvider;

    fn create_catalog(
        &self,
        config: &Config,
        credentials: &CredentialStore,
        client: Arc<Client>,
        session_token: Option<String>,
    ) -> Result<Arc<dyn CatalogApi>>;

    /// Check that everything the provider needs is configured
    fn validate_config(&self, config: &Config, credentials: &CredentialStore) -> Result<()>;
}

pub struct CatalogFactoryRegistry {
    factories: HashMap<CatalogProvider, Box<dyn CatalogFactory>>,
}

impl CatalogFactoryRegistry {
    /// Create a registry with both built-in providers registered
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(Box::new(proxy::ProxyCatalogFactory));
        registry.register(Box::new(tmdb::TmdbCatalogFactory));
        registry
    }

    pub fn register(&mut self, factory: Box<dyn CatalogFactory>) {
        self.factories.insert(factory.provider(), factory);
    }

    pub fn create(
        &self,
        config: &Config,
        credentials: &CredentialStore,
        client: Arc<Client>,
        session_token: Option<String>,
    ) -> Result<Arc<dyn CatalogApi>> {
        let provider = config.catalog.provider;
        let factory = self
            .factories
            .get(&provider)
            .ok_or_else(|| anyhow::anyhow!("No catalog factory registered for {:?}", provider))?;
        factory.validate_config(config, credentials)?;
        factory.create_catalog(config, credentials, client, session_token)
    }

    pub fn is_registered(&self, provider: CatalogProvider) -> bool {
        self.factories.contains_key(&provider)
    }
}

impl Default for CatalogFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

mod proxy {
    use super::*;

    pub struct ProxyCatalogFactory;

    impl CatalogFactory for ProxyCatalogFactory {
        fn provider(&self) -> CatalogProvider {
            CatalogProvider::Proxy
        }

        fn create_catalog(
            &self,
            config: &Config,
            _credentials: &CredentialStore,
            client: Arc<Client>,
            session_token: Option<String>,
        ) -> Result<Arc<dyn CatalogApi>> {
            Ok(Arc::new(
                ProxyCatalogClient::new(client, config.endpoints.users.clone()).with_token(session_token),
            ))
        }

        fn validate_config(&self, _config: &Config, _credentials: &CredentialStore) -> Result<()> {
            Ok(())
        }
    }
}

mod tmdb {
    use super::*;

    pub struct TmdbCatalogFactory;

    impl CatalogFactory for TmdbCatalogFactory {
        fn provider(&self) -> CatalogProvider {
            CatalogProvider::Tmdb
        }

        fn create_catalog(
            &self,
            config: &Config,
            credentials: &CredentialStore,
            client: Arc<Client>,
            _session_token: Option<String>,
        ) -> Result<Arc<dyn CatalogApi>> {
            let token = credentials
                .get_tmdb_api_token()
                .ok_or_else(|| anyhow::anyhow!("TMDB catalog selected but no API token is stored"))?;
            Ok(Arc::new(TmdbCatalogClient::new(
                client,
                config.endpoints.tmdb.clone(),
                token.clone(),
            )))
        }

        fn validate_config(&self, _config: &Config, credentials: &CredentialStore) -> Result<()> {
            match credentials.get_tmdb_api_token() {
                Some(token) if !token.trim().is_empty() => Ok(()),
                _ => Err(anyhow::anyhow!(
                    "catalog.provider is \"tmdb\" but no TMDB API token is configured (run `cinemarec config set-tmdb-token`)"
                )),
            }
        }
    }
}

/// Every service client the view-models need, sharing one HTTP client
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthApi>,
    pub preferences: Arc<dyn PreferencesApi>,
    pub recommendations: Arc<dyn RecommendationsApi>,
    pub statistics: Arc<dyn StatisticsApi>,
    pub reviews: Arc<dyn ReviewsApi>,
    pub quizzes: Arc<dyn QuizzesApi>,
    pub catalog: Arc<dyn CatalogApi>,
}

impl Services {
    /// Build all clients. `session_token` is attached as a bearer token to every
    /// authenticated call.
    pub fn from_config(config: &Config, credentials: &CredentialStore, session_token: Option<String>) -> Result<Self> {
        let client = Arc::new(build_client(&config.http)?);
        let endpoints = &config.endpoints;
        debug!("Building service clients (catalog provider {:?})", config.catalog.provider);

        let users = Arc::new(
            UsersClient::new(client.clone(), endpoints.users.clone(), endpoints.recommendations.clone())
                .with_token(session_token.clone()),
        );
        let catalog = CatalogFactoryRegistry::new().create(config, credentials, client.clone(), session_token.clone())?;

        Ok(Self {
            auth: Arc::new(AuthClient::new(client.clone(), endpoints.auth.clone())),
            preferences: users.clone(),
            recommendations: users,
            statistics: Arc::new(
                StatisticsClient::new(client.clone(), endpoints.statistics.clone()).with_token(session_token.clone()),
            ),
            reviews: Arc::new(ReviewsClient::new(client.clone(), endpoints.reviews.clone()).with_token(session_token.clone())),
            quizzes: Arc::new(QuizzesClient::new(client, endpoints.quizzes.clone()).with_token(session_token)),
            catalog,
        })
    }
}
