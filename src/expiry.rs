use time::{Duration, OffsetDateTime};

use crate::model::CredentialBundle;

/// How long before `expires_at` a token stops being handed out.
pub const DEFAULT_EXPIRY_MARGIN: Duration = Duration::minutes(5);

/// Whether `bundle`'s access token may still be sent at `now`.
///
/// Tokens inside `margin` of their expiry count as unusable so they are
/// refreshed before the server can see them lapse mid-request.
pub fn is_usable(bundle: Option<&CredentialBundle>, now: OffsetDateTime, margin: Duration) -> bool {
    match bundle {
        Some(bundle) => bundle
            .expires_at
            .checked_sub(margin)
            .is_some_and(|deadline| now < deadline),
        None => false,
    }
}
