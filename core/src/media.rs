//! Media type matching for `Content-Type` values.
//!
//! Only the part before the first `;` is compared; parameters such as
//! `charset` are ignored. Comparison is case-sensitive.

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

/// The media type portion of a `Content-Type` value, without parameters.
pub fn essence(content_type: &str) -> &str {
    content_type
        .split_once(';')
        .map_or(content_type, |(media, _)| media)
        .trim()
}

/// `true` when the media type of `content_type` begins with `media_type`.
///
/// This is the rule the JSON strategies use, so `application/json-patch+json`
/// matches `application/json` as well.
pub fn starts_with(content_type: &str, media_type: &str) -> bool {
    essence(content_type).starts_with(media_type)
}

pub fn is_json(content_type: &str) -> bool {
    starts_with(content_type, APPLICATION_JSON)
}
