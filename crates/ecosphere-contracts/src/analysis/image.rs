use std::path::Path;

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Image payload ready to be sent as an inline data part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Accepts either a `data:image/<type>;base64,` URI or bare base64 text.
    ///
    /// The header, when present, is stripped and its MIME type kept; bare input
    /// is only trimmed and declared as JPEG.
    pub fn from_encoded(input: &str) -> Self {
        let trimmed = input.trim();
        match split_image_header(trimmed) {
            Some((mime_type, data)) => Self {
                mime_type,
                data: data.to_string(),
            },
            None => Self {
                mime_type: DEFAULT_IMAGE_MIME.to_string(),
                data: trimmed.to_string(),
            },
        }
    }
}

// Parameters between the subtype and `;base64` (RFC 2397) are ignored.
fn split_image_header(input: &str) -> Option<(String, &str)> {
    let (header, data) = input.split_once(',')?;
    let lowered = header.to_ascii_lowercase();
    let media = lowered
        .strip_prefix("data:image/")?
        .strip_suffix(";base64")?;
    let subtype = media.split(';').next().unwrap_or_default().trim();
    if subtype.is_empty()
        || !subtype
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
    {
        return None;
    }
    let subtype = if subtype == "jpg" { "jpeg" } else { subtype };
    Some((format!("image/{subtype}"), data.trim()))
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}
