use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::errors::ApiError;
use crate::core::state::AppState;

const ACTING_USER_HEADER: &str = "x-acting-user";

pub(crate) const SYSTEM_USER: &str = "System";

/// Identity recorded as `uploaded_by` on writes. The upstream gateway injects
/// the header after authenticating; when it is absent or blank the submission
/// is attributed to the `System` sentinel.
pub(crate) struct ActingUser(pub(crate) String);

#[async_trait]
impl FromRequestParts<AppState> for ActingUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(ACTING_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(SYSTEM_USER);

        Ok(ActingUser(name.to_string()))
    }
}
