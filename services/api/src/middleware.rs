//! Authentication middleware: bearer extraction, token verification against
//! the identity provider's published signing keys, and lazy local user
//! resolution.

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use tracing::{debug, error};

use crate::{error::ApiError, state::AppState};

/// Identity provider configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Provider domain, e.g. `tenant.eu.auth0.com`
    pub domain: String,
    /// Expected `aud` claim
    pub audience: String,
}

impl AuthConfig {
    /// Read the provider configuration from `AUTH_DOMAIN` and
    /// `AUTH_AUDIENCE`. Returns `None` when either is unset, which disables
    /// verification entirely (development mode: every protected request is
    /// rejected, no user is ever attached).
    pub fn from_env() -> Option<Self> {
        let domain = env::var("AUTH_DOMAIN").ok()?;
        let audience = env::var("AUTH_AUDIENCE").ok()?;
        Some(AuthConfig { domain, audience })
    }

    fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.domain)
    }

    fn issuer(&self) -> String {
        format!("https://{}/", self.domain)
    }
}

/// Token claims. Only `sub` is structural; profile claims are looked up
/// dynamically because providers namespace them differently.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JWKS document as published at `/.well-known/jwks.json`
#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Single JSON Web Key; only the RSA components we verify with
#[derive(Debug, Deserialize)]
struct Jwk {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Token verifier backed by the identity provider's JWKS endpoint
#[derive(Clone)]
pub struct TokenVerifier {
    config: Option<AuthConfig>,
    http: reqwest::Client,
}

impl TokenVerifier {
    pub fn new(config: Option<AuthConfig>) -> Self {
        TokenVerifier {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Verify a bearer token: fetch the provider's signing keys, select the
    /// key matching the token's `kid`, and validate signature, audience, and
    /// issuer. All failure modes collapse into an error; callers respond 401
    /// without distinguishing them.
    pub async fn verify(&self, token: &str) -> Result<Claims> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("identity provider is not configured"))?;

        let header = decode_header(token)?;
        let kid = header
            .kid
            .ok_or_else(|| anyhow::anyhow!("token header has no key id"))?;

        let jwks: JwkSet = self
            .http
            .get(config.jwks_url())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|key| key.kid.as_deref() == Some(kid.as_str()))
            .ok_or_else(|| anyhow::anyhow!("no signing key matches token key id"))?;

        let (n, e) = match (&jwk.n, &jwk.e) {
            (Some(n), Some(e)) => (n, e),
            _ => anyhow::bail!("signing key is missing RSA components"),
        };

        let decoding_key = DecodingKey::from_rsa_components(n, e)?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[config.issuer()]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    pub fn domain(&self) -> Option<&str> {
        self.config.as_ref().map(|c| c.domain.as_str())
    }
}

/// Extract the token from an `Authorization` header value. The scheme must
/// be "bearer" (case-insensitive) followed by exactly one token part.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(token)
}

/// Derive (email, name) for a first-time user from token claims.
///
/// Email falls back from the `email` claim to the provider-namespaced
/// `{domain}/email` claim to `nickname@noemail.com`; name falls back from
/// `name` to `nickname` to the local part of the derived email.
pub fn derive_profile(claims: &Claims, domain: Option<&str>) -> (String, String) {
    let claim_str = |key: &str| claims.extra.get(key).and_then(Value::as_str);

    let namespaced_email = domain.map(|d| format!("{d}/email"));
    let email = claim_str("email")
        .or_else(|| namespaced_email.as_deref().and_then(claim_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            let nickname = claim_str("nickname").unwrap_or(claims.sub.as_str());
            format!("{nickname}@noemail.com")
        });

    let name = claim_str("name")
        .or_else(|| claim_str("nickname"))
        .map(str::to_string)
        .unwrap_or_else(|| {
            email
                .split('@')
                .next()
                .unwrap_or(email.as_str())
                .to_string()
        });

    (email, name)
}

/// Authentication middleware for all ownership-scoped routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = extract_bearer_token(auth_header).ok_or(ApiError::Unauthorized)?;

    let claims = state.verifier.verify(token).await.map_err(|e| {
        debug!("Token verification failed: {}", e);
        ApiError::Unauthorized
    })?;

    let (email, name) = derive_profile(&claims, state.verifier.domain());

    // Resolve or lazily create the local user for this subject
    let user = state
        .user_repository
        .resolve_or_create(&claims.sub, &email, &name)
        .await
        .map_err(|e| {
            error!("Database error during authentication: {}", e);
            ApiError::InternalServerError
        })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_extraction_accepts_well_formed_header() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_extraction_is_scheme_case_insensitive() {
        assert_eq!(extract_bearer_token("bearer tok"), Some("tok"));
        assert_eq!(extract_bearer_token("BEARER tok"), Some("tok"));
    }

    #[test]
    fn bearer_extraction_rejects_wrong_scheme() {
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
    }

    #[test]
    fn bearer_extraction_rejects_missing_token() {
        assert_eq!(extract_bearer_token("Bearer"), None);
    }

    #[test]
    fn bearer_extraction_rejects_extra_parts() {
        assert_eq!(extract_bearer_token("Bearer tok extra"), None);
    }

    #[test]
    fn bearer_extraction_rejects_empty_header() {
        assert_eq!(extract_bearer_token(""), None);
    }

    fn claims_with(extra: Value) -> Claims {
        Claims {
            sub: "auth0|12345".to_string(),
            extra: extra.as_object().expect("object literal").clone(),
        }
    }

    #[test]
    fn profile_prefers_plain_email_claim() {
        let claims = claims_with(json!({
            "email": "lifter@example.com",
            "name": "Lifter",
        }));
        let (email, name) = derive_profile(&claims, Some("tenant.auth0.com"));
        assert_eq!(email, "lifter@example.com");
        assert_eq!(name, "Lifter");
    }

    #[test]
    fn profile_falls_back_to_namespaced_email() {
        let claims = claims_with(json!({
            "tenant.auth0.com/email": "spotter@example.com",
        }));
        let (email, _) = derive_profile(&claims, Some("tenant.auth0.com"));
        assert_eq!(email, "spotter@example.com");
    }

    #[test]
    fn profile_builds_placeholder_email_from_nickname() {
        let claims = claims_with(json!({"nickname": "ironfan"}));
        let (email, name) = derive_profile(&claims, Some("tenant.auth0.com"));
        assert_eq!(email, "ironfan@noemail.com");
        assert_eq!(name, "ironfan");
    }

    #[test]
    fn profile_falls_back_to_subject_when_no_claims_exist() {
        let claims = claims_with(json!({}));
        let (email, name) = derive_profile(&claims, None);
        assert_eq!(email, "auth0|12345@noemail.com");
        assert_eq!(name, "auth0|12345");
    }

    #[test]
    fn profile_name_uses_local_part_of_derived_email() {
        let claims = claims_with(json!({"email": "benched@example.com"}));
        let (_, name) = derive_profile(&claims, None);
        assert_eq!(name, "benched");
    }
}
