//! Session verification and role gating.
//!
//! Every route requires a verified identity-provider session, carried either
//! in the `session` cookie or as a bearer token. Tokens are RS256 JWTs
//! verified against the provider's published JWK set, which is cached and
//! refreshed when an unknown key id shows up.
//!
//! When the identity provider is unconfigured the verifier runs in mock mode
//! and every request is attributed to a dev super-admin, mirroring the video
//! host client's mock mode.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use kstream_models::{ActorRef, AdminRole, AdminUser};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Default JWK set for identity-provider session cookies.
const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// How long a fetched JWK set stays fresh.
const JWKS_TTL: Duration = Duration::from_secs(3600);

/// Name of the session cookie issued by the dashboard login flow.
const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

/// Claims carried in a session token.
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    /// Custom role claim stamped at login. Absent means editor.
    #[serde(default)]
    role: Option<String>,
}

enum VerifierMode {
    /// Identity provider unconfigured: every request is the dev admin.
    Mock,
    Live {
        project_id: String,
        jwks_url: String,
        http: reqwest::Client,
        cache: RwLock<Option<CachedKeys>>,
    },
}

/// Verifies session tokens against the identity provider's JWK set.
pub struct SessionVerifier {
    mode: VerifierMode,
}

impl SessionVerifier {
    /// Build from environment. A missing project id selects mock mode,
    /// AUTH_FORCE_MOCK=1 forces it.
    pub fn from_env() -> Self {
        let forced = std::env::var("AUTH_FORCE_MOCK")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let project_id = std::env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| std::env::var("GCP_PROJECT_ID"))
            .ok()
            .filter(|v| !v.is_empty());

        match project_id {
            Some(project_id) if !forced => {
                let jwks_url = std::env::var("SESSION_JWKS_URL")
                    .unwrap_or_else(|_| DEFAULT_JWKS_URL.to_string());
                Self {
                    mode: VerifierMode::Live {
                        project_id,
                        jwks_url,
                        http: reqwest::Client::new(),
                        cache: RwLock::new(None),
                    },
                }
            }
            _ => {
                info!("Identity provider unconfigured, session verification in mock mode");
                Self {
                    mode: VerifierMode::Mock,
                }
            }
        }
    }

    /// Verifier that accepts any request as the dev admin. Test helper.
    pub fn mock() -> Self {
        Self {
            mode: VerifierMode::Mock,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.mode, VerifierMode::Mock)
    }

    fn dev_admin() -> AdminUser {
        AdminUser {
            uid: "dev-admin".to_string(),
            email: Some("dev-admin@localhost".to_string()),
            display_name: Some("Dev Admin".to_string()),
            role: AdminRole::SuperAdmin,
        }
    }

    /// Verify a session token and return the admin identity it describes.
    pub async fn verify(&self, token: Option<&str>) -> ApiResult<AdminUser> {
        match &self.mode {
            VerifierMode::Mock => Ok(Self::dev_admin()),
            VerifierMode::Live {
                project_id,
                jwks_url,
                http,
                cache,
            } => {
                let token = token
                    .ok_or_else(|| ApiError::unauthorized("Missing session"))?
                    .trim();
                if token.is_empty() {
                    return Err(ApiError::unauthorized("Missing session"));
                }

                let header = decode_header(token)
                    .map_err(|e| ApiError::unauthorized(format!("Malformed token: {e}")))?;
                let kid = header
                    .kid
                    .ok_or_else(|| ApiError::unauthorized("Token has no key id"))?;

                let jwk = self.lookup_key(http, jwks_url, cache, &kid).await?;
                let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
                    .map_err(|e| ApiError::internal(format!("Bad JWK: {e}")))?;

                let mut validation = Validation::new(Algorithm::RS256);
                validation.set_audience(&[project_id]);
                validation.set_issuer(&[format!(
                    "https://session.firebase.google.com/{project_id}"
                )]);

                let data = decode::<SessionClaims>(token, &key, &validation)
                    .map_err(|e| ApiError::unauthorized(format!("Invalid session: {e}")))?;
                let claims = data.claims;

                let role = claims
                    .role
                    .as_deref()
                    .and_then(AdminRole::parse)
                    .unwrap_or(AdminRole::Editor);

                Ok(AdminUser {
                    uid: claims.sub,
                    email: claims.email,
                    display_name: claims.name,
                    role,
                })
            }
        }
    }

    async fn lookup_key(
        &self,
        http: &reqwest::Client,
        jwks_url: &str,
        cache: &RwLock<Option<CachedKeys>>,
        kid: &str,
    ) -> ApiResult<Jwk> {
        {
            let cached = cache.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.fetched_at.elapsed() < JWKS_TTL {
                    if let Some(jwk) = entry.keys.get(kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        // Stale cache or unknown kid (key rotation): refetch.
        debug!(kid, "Refreshing JWK set");
        let set: JwkSet = http
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| ApiError::internal(format!("JWK fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| ApiError::internal(format!("JWK fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| ApiError::internal(format!("JWK parse failed: {e}")))?;

        let keys: HashMap<String, Jwk> =
            set.keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
        let jwk = keys.get(kid).cloned();

        *cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        jwk.ok_or_else(|| {
            warn!(kid, "Session token signed with unknown key");
            ApiError::unauthorized("Session signed with unknown key")
        })
    }
}

/// Extractor for the authenticated admin behind a request.
pub struct SessionUser(pub AdminUser);

impl SessionUser {
    /// Reject with 403 unless the session's role satisfies `required`.
    pub fn require(&self, required: AdminRole) -> ApiResult<()> {
        if self.0.role.satisfies(required) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Requires {} role",
                required.as_str()
            )))
        }
    }

    /// Actor reference for audit entries.
    pub fn actor(&self) -> ActorRef {
        ActorRef {
            uid: self.0.uid.clone(),
            email: self.0.email.clone(),
            display_name: self.0.display_name.clone(),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let bearer = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);

        let cookie = CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string());

        let token = bearer.or(cookie);
        let user = state.auth.verify(token.as_deref()).await?;
        Ok(SessionUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_mode_grants_dev_admin() {
        let verifier = SessionVerifier::mock();
        let user = verifier.verify(None).await.unwrap();
        assert_eq!(user.uid, "dev-admin");
        assert_eq!(user.role, AdminRole::SuperAdmin);
    }

    #[test]
    fn test_role_gate() {
        let user = SessionUser(AdminUser {
            uid: "u1".into(),
            email: None,
            display_name: None,
            role: AdminRole::Admin,
        });
        assert!(user.require(AdminRole::Editor).is_ok());
        assert!(user.require(AdminRole::Admin).is_ok());
        assert!(user.require(AdminRole::SuperAdmin).is_err());
    }
}
