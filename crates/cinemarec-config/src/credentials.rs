use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const SESSION_TOKEN: &str = "session_token";
const SESSION_SAVED_AT: &str = "session_saved_at";
const RETURN_TO: &str = "return_to";
const TMDB_API_TOKEN: &str = "tmdb_api_token";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Client-side credential storage.
///
/// Holds the session token issued by the identity service, the route a user asked for
/// before being sent to login, and the optional catalog API token.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_session_token(&self) -> Option<&String> {
        self.get(SESSION_TOKEN)
    }

    /// Replace the cached session token (login)
    pub fn set_session_token(&mut self, token: String) {
        self.set(SESSION_TOKEN.to_string(), token);
        self.set(SESSION_SAVED_AT.to_string(), Utc::now().to_rfc3339());
    }

    /// Purge the cached session token (logout, expiry, undecodable token)
    pub fn clear_session(&mut self) {
        self.remove(SESSION_TOKEN);
        self.remove(SESSION_SAVED_AT);
    }

    pub fn get_session_saved_at(&self) -> Option<DateTime<Utc>> {
        self.get(SESSION_SAVED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn get_return_to(&self) -> Option<&String> {
        self.get(RETURN_TO)
    }

    pub fn set_return_to(&mut self, route: String) {
        self.set(RETURN_TO.to_string(), route);
    }

    /// Read and forget the pending return route
    pub fn take_return_to(&mut self) -> Option<String> {
        self.credentials.remove(RETURN_TO)
    }

    pub fn get_tmdb_api_token(&self) -> Option<&String> {
        self.get(TMDB_API_TOKEN)
    }

    pub fn set_tmdb_api_token(&mut self, token: String) {
        self.set(TMDB_API_TOKEN.to_string(), token);
    }

    pub fn get_all_keys(&self) -> Vec<String> {
        self.credentials.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_session_token("header.payload.sig".to_string());
        store.set_tmdb_api_token("tmdb".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get_session_token(), Some(&"header.payload.sig".to_string()));
        assert_eq!(loaded_store.get_tmdb_api_token(), Some(&"tmdb".to_string()));
        assert!(loaded_store.get_session_saved_at().is_some());
    }

    #[test]
    fn test_clear_session_keeps_other_keys() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/cinemarec-creds-test"));
        store.set_session_token("token".to_string());
        store.set_tmdb_api_token("tmdb".to_string());

        store.clear_session();
        assert_eq!(store.get_session_token(), None);
        assert_eq!(store.get_session_saved_at(), None);
        assert_eq!(store.get_tmdb_api_token(), Some(&"tmdb".to_string()));
    }

    #[test]
    fn test_take_return_to_is_one_shot() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/cinemarec-creds-test"));
        store.set_return_to("/dashboard?tab=reviews".to_string());

        assert_eq!(store.take_return_to(), Some("/dashboard?tab=reviews".to_string()));
        assert_eq!(store.take_return_to(), None);
    }
}
