use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Role embedded in the session token by the identity service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Unknown => "Unknown",
        }
    }
}

/// Claims carried in the payload segment of a session token.
///
/// The client never verifies the signature; the services do. These claims are only
/// read to drive navigation (who is signed in, which role, when the session ends).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject identifier, the user's email
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl SessionClaims {
    pub fn email(&self) -> &str {
        &self.sub
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// A token whose expiry cannot be represented counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => expires_at <= now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        let claims: SessionClaims =
            serde_json::from_str(r#"{"sub":"a@b.io","role":"ADMIN","exp":10}"#).unwrap();
        assert_eq!(claims.role, Role::Admin);

        let claims: SessionClaims =
            serde_json::from_str(r#"{"sub":"a@b.io","role":"MODERATOR","exp":10}"#).unwrap();
        assert_eq!(claims.role, Role::Unknown);

        let claims: SessionClaims = serde_json::from_str(r#"{"sub":"a@b.io","exp":10}"#).unwrap();
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: "a@b.io".to_string(),
            role: Role::User,
            exp: now.timestamp() - 1,
            iat: None,
        };
        assert!(claims.is_expired_at(now));

        let claims = SessionClaims { exp: now.timestamp() + 3600, ..claims };
        assert!(!claims.is_expired_at(now));
    }
}
