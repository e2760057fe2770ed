//! Resource paths built from caller-supplied ids.

use taskboard_auth::{AuthError, AuthResult};

/// Join `prefix` and one percent-encoded `id` segment.
///
/// Ids that would collapse into a dot segment once the URL is normalized
/// are rejected rather than sent to a different resource.
pub(crate) fn resource_path(prefix: &str, id: &str) -> AuthResult<String> {
    if matches!(id, "" | "." | "..") {
        return Err(AuthError::InvalidInput(format!("invalid resource id {:?}", id)));
    }
    let segment: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    Ok(format!("{}/{}", prefix, segment.replace('+', "%20")))
}
