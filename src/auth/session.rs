use axum::http::{HeaderMap, header::COOKIE};
use rand::Rng;

use super::PasswordHasher;
use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "geeknews";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;
const SECRET_BYTES: usize = 12;

/// Name of the cookie carrying the raw session token.
pub const SESSION_COOKIE: &str = "geeknews_session";

pub struct SessionTokenGenerator {
    hasher: PasswordHasher,
}

impl Default for SessionTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTokenGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: PasswordHasher::new(),
        }
    }

    /// Generates a new session token with the format: geeknews_<lookup>_<secret>
    /// Returns (raw_token, lookup, hash)
    pub fn generate(&self) -> Result<(String, String, String)> {
        let lookup = generate_lookup();
        let secret = generate_secret();
        let raw_token = build_token(&lookup, &secret);
        let hash = self.hasher.hash(&raw_token)?;
        Ok((raw_token, lookup, hash))
    }

    /// Verifies a raw session token against a stored hash
    pub fn verify(&self, token: &str, hash: &str) -> Result<bool> {
        self.hasher.verify(token, hash)
    }
}

/// Generates the lookup portion of the token (first 8 chars of a UUID)
#[must_use]
fn generate_lookup() -> String {
    let uuid = uuid::Uuid::new_v4();
    uuid.to_string()[..LOOKUP_LENGTH].to_string()
}

/// Generates a cryptographically secure random hex string for the secret
#[must_use]
fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)[..SECRET_LENGTH].to_string()
}

/// Builds the full token string from lookup and secret
#[must_use]
fn build_token(lookup: &str, secret: &str) -> String {
    format!("{TOKEN_PREFIX}_{lookup}_{secret}")
}

/// Parses a session token into its components (lookup, secret)
pub fn parse_session_token(token: &str) -> Result<(String, String)> {
    let prefix = format!("{TOKEN_PREFIX}_");
    if !token.starts_with(&prefix) {
        return Err(Error::InvalidTokenFormat);
    }

    let parts: Vec<&str> = token.split('_').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidTokenFormat);
    }

    let lookup = parts[1];
    let secret = parts[2];

    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup.to_string(), secret.to_string()))
}

/// Set-Cookie value installing the session token.
#[must_use]
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Set-Cookie value removing the session cookie.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extracts the raw session token from the request's Cookie headers.
/// Returns None when no session cookie is present.
#[must_use]
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((name, token)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE && !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_format() {
        let generator = SessionTokenGenerator::new();
        let (token, lookup, _hash) = generator.generate().unwrap();

        assert!(token.starts_with("geeknews_"));
        assert_eq!(lookup.len(), 8);

        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "geeknews");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 24);
    }

    #[test]
    fn test_token_verification_correct() {
        let generator = SessionTokenGenerator::new();
        let (token, _, hash) = generator.generate().unwrap();

        assert!(generator.verify(&token, &hash).unwrap());
    }

    #[test]
    fn test_token_verification_wrong_secret() {
        let generator = SessionTokenGenerator::new();
        let (token, _, hash) = generator.generate().unwrap();

        let wrong_token = format!("{}_wrong", &token[..token.len() - 5]);
        assert!(!generator.verify(&wrong_token, &hash).unwrap());
    }

    #[test]
    fn test_parse_token_valid() {
        let (lookup, secret) =
            parse_session_token("geeknews_12345678_123456789012345678901234").unwrap();
        assert_eq!(lookup, "12345678");
        assert_eq!(secret, "123456789012345678901234");
    }

    #[test]
    fn test_parse_token_invalid_prefix() {
        let result = parse_session_token("invalid_12345678_123456789012345678901234");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_token_wrong_parts() {
        let result = parse_session_token("geeknews_12345678");
        assert!(result.is_err());
    }

    #[test]
    fn test_cookie_header_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            "theme=dark; geeknews_session=geeknews_abc_def; lang=en"
                .parse()
                .unwrap(),
        );
        assert_eq!(
            session_token_from_headers(&headers).as_deref(),
            Some("geeknews_abc_def")
        );
    }

    #[test]
    fn test_cookie_header_missing() {
        let headers = HeaderMap::new();
        assert!(session_token_from_headers(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark".parse().unwrap());
        assert!(session_token_from_headers(&headers).is_none());
    }
}
