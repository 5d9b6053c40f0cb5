// Admin session gate.
//
// Login exchanges the admin password for a bearer token; every admin route
// checks the token through this middleware. Tokens are self-contained and
// expire after a fixed TTL, so there is no server-side session store.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::app::AppState;
use crate::utils::ServiceError;

/// Sessions expire this long after login
pub const SESSION_TTL_HOURS: i64 = 24;

/// Constant-time password check for the login endpoint
pub fn verify_password(candidate: &str, actual: &str) -> bool {
    candidate.as_bytes().ct_eq(actual.as_bytes()).into()
}

/// Mint a session token: `{issued_millis}.{nonce}.{signature}`
pub fn issue_token(secret: &str, now: DateTime<Utc>) -> String {
    let issued = now.timestamp_millis();
    let nonce = format!("{:016x}", rand::random::<u64>());
    let sig = signature(secret, &issued.to_string(), &nonce);
    format!("{}.{}.{}", issued, nonce, sig)
}

pub fn expires_at(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::hours(SESSION_TTL_HOURS)
}

/// Check a presented token against the admin secret and the clock.
/// Tampered tokens, future-dated tokens, and tokens past the TTL all fail.
pub fn is_valid(token: &str, secret: &str, now: DateTime<Utc>) -> bool {
    let mut parts = token.splitn(3, '.');
    let (Some(issued_str), Some(nonce), Some(sig)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Ok(issued_ms) = issued_str.parse::<i64>() else {
        return false;
    };

    let expected = signature(secret, issued_str, nonce);
    if !bool::from(expected.as_bytes().ct_eq(sig.as_bytes())) {
        return false;
    }

    let Some(issued) = DateTime::from_timestamp_millis(issued_ms) else {
        return false;
    };

    issued <= now && now - issued <= Duration::hours(SESSION_TTL_HOURS)
}

fn signature(secret: &str, issued: &str, nonce: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(issued.as_bytes());
    hasher.update(b".");
    hasher.update(nonce.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Reject admin requests without a valid bearer token
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if is_valid(token, &state.config.admin_password, Utc::now()) => {
            next.run(request).await
        }
        _ => {
            debug!(path = %request.uri().path(), "Rejected unauthenticated admin request");
            ServiceError::Unauthorized.into_response()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "test-admin-password";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_tokens_validate() {
        let now = fixed_now();
        let token = issue_token(SECRET, now);
        assert!(is_valid(&token, SECRET, now));
        assert!(is_valid(&token, SECRET, now + Duration::hours(23)));
    }

    #[test]
    fn tokens_expire_after_the_ttl() {
        let now = fixed_now();
        let token = issue_token(SECRET, now);
        assert!(is_valid(&token, SECRET, now + Duration::hours(24)));
        assert!(!is_valid(
            &token,
            SECRET,
            now + Duration::hours(24) + Duration::seconds(1)
        ));
    }

    #[test]
    fn future_dated_tokens_are_rejected() {
        let now = fixed_now();
        let token = issue_token(SECRET, now + Duration::hours(1));
        assert!(!is_valid(&token, SECRET, now));
    }

    #[test]
    fn tampering_invalidates_the_token() {
        let now = fixed_now();
        let token = issue_token(SECRET, now);

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('0');
        assert!(!is_valid(&tampered, SECRET, now));

        assert!(!is_valid(&token, "other-secret", now));
        assert!(!is_valid("", SECRET, now));
        assert!(!is_valid("garbage", SECRET, now));
        assert!(!is_valid("1.2", SECRET, now));
    }

    #[test]
    fn password_check_is_exact() {
        assert!(verify_password(SECRET, SECRET));
        assert!(!verify_password("wrong", SECRET));
        assert!(!verify_password("", SECRET));
    }
}
