use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};

use crate::{WorkspaceError, WorkspaceResult};

/// Data URL prefixes accepted for a reference image.
pub const ACCEPTED_REFERENCE_PREFIXES: [&str; 2] =
    ["data:image/png;base64,", "data:image/jpeg;base64,"];

/// Check that `data_url` is a base64 PNG or JPEG data URL.
pub fn validate_reference_image(data_url: &str) -> WorkspaceResult<()> {
    let payload = ACCEPTED_REFERENCE_PREFIXES
        .iter()
        .find_map(|prefix| data_url.strip_prefix(prefix))
        .ok_or_else(|| {
            WorkspaceError::InvalidReferenceImage(
                "only PNG and JPEG data URLs are accepted".to_string(),
            )
        })?;

    if payload.is_empty() {
        return Err(WorkspaceError::InvalidReferenceImage(
            "image data is empty".to_string(),
        ));
    }
    BASE64_STANDARD
        .decode(payload)
        .map_err(|error| WorkspaceError::InvalidReferenceImage(error.to_string()))?;
    Ok(())
}
