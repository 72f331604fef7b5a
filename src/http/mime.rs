use std::path::Path;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension (lower-case) to content type, for the types a static site
/// serves most. Text types carry an explicit charset.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("txt", "text/plain; charset=utf-8"),
    ("json", "application/json"),
    ("xml", "text/xml; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("pdf", "application/pdf"),
    ("wasm", "application/wasm"),
];

/// Returns the `Content-Type` to send for `path`.
///
/// Looks the extension up case-insensitively in the built-in table, then
/// asks `mime_guess`, then gives up with `application/octet-stream`.
///
/// ```
/// # use lantern::http::mime::content_type_for;
/// # use std::path::Path;
/// assert_eq!(content_type_for(Path::new("a/INDEX.HTML")), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("no_extension")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> String {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_CONTENT_TYPE.to_string();
    };

    CONTENT_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, content_type)| content_type.to_string())
        .unwrap_or_else(|| {
            mime_guess::from_ext(ext)
                .first_or_octet_stream()
                .to_string()
        })
}
