use axum::Extension;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use feedesk_application::RateLimitRule;
use feedesk_core::AppError;
use feedesk_domain::EffectiveUser;
use tower_sessions::Session;

use crate::auth::{SESSION_ABSOLUTE_TIMEOUT_SECONDS, SESSION_CREATED_AT_KEY, SESSION_USER_KEY};
use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the public key of the single-page app.
pub const API_KEY_HEADER: &str = "apikey";

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if presented != Some(state.api_public_key.as_str()) {
        return Err(AppError::Unauthorized("missing or invalid api key".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Loads the session's effective user into request extensions.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let user = session
        .get::<EffectiveUser>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session user: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let created_at = session
        .get::<i64>(SESSION_CREATED_AT_KEY)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read session creation time: {error}"))
        })?
        .unwrap_or_default();

    if Utc::now().timestamp() - created_at > SESSION_ABSOLUTE_TIMEOUT_SECONDS {
        session
            .flush()
            .await
            .map_err(|error| AppError::Internal(format!("failed to end session: {error}")))?;
        return Err(AppError::Unauthorized("session expired, sign in again".to_owned()).into());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method())
        && !is_same_origin(request.headers(), &state.frontend_url)
    {
        return Err(AppError::Forbidden("origin validation failed".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Counts the request against the route family's rule, keyed by client.
pub async fn rate_limit(
    State(state): State<AppState>,
    Extension(rule): Extension<RateLimitRule>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let client = client_key(request.headers());
    state
        .rate_limit_service
        .check_rate_limit(&rule, &client)
        .await?;

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

pub(crate) fn is_same_origin(headers: &HeaderMap, allowed_origin: &str) -> bool {
    if headers.get("sec-fetch-site") == Some(&HeaderValue::from_static("cross-site")) {
        return false;
    }

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    origin == allowed_origin
        || referer == allowed_origin
        || referer
            .strip_prefix(allowed_origin)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// First hop of `x-forwarded-for`, or `unknown`.
pub(crate) fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};
    use proptest::prelude::*;

    use super::{client_key, is_same_origin};

    const FRONTEND: &str = "https://fees.college.edu";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                *name,
                HeaderValue::from_str(value).unwrap_or_else(|_| panic!("valid header value")),
            );
        }
        map
    }

    #[test]
    fn matching_origin_passes() {
        assert!(is_same_origin(&headers(&[("origin", FRONTEND)]), FRONTEND));
        assert!(is_same_origin(
            &headers(&[("referer", "https://fees.college.edu/admin/users")]),
            FRONTEND
        ));
    }

    #[test]
    fn lookalike_referer_is_rejected() {
        assert!(!is_same_origin(
            &headers(&[("referer", "https://fees.college.edu.attacker.io/")]),
            FRONTEND
        ));
    }

    #[test]
    fn cross_site_fetch_is_rejected_even_with_origin() {
        let mut map = headers(&[("origin", FRONTEND)]);
        map.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));
        assert!(!is_same_origin(&map, FRONTEND));
    }

    #[test]
    fn missing_headers_fail_closed() {
        assert!(!is_same_origin(&HeaderMap::new(), FRONTEND));
    }

    #[test]
    fn client_key_uses_first_forwarded_hop() {
        let map = headers(&[("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")]);
        assert_eq!(client_key(&map), "203.0.113.7");
        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }

    proptest! {
        #[test]
        fn foreign_origins_never_pass(host in "[a-z]{1,12}\\.[a-z]{2,5}") {
            let origin = format!("https://{host}");
            prop_assume!(origin != FRONTEND);

            let mut map = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(&origin) {
                map.insert(header::ORIGIN, value);
            }
            prop_assert!(!is_same_origin(&map, FRONTEND));
        }
    }
}
