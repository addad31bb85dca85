//! Content-Type inference from file extensions.

pub const TEXT_PLAIN: &str = "text/plain";

/// Maps a file name to its Content-Type by the text after the last `.`.
///
/// Unknown extensions, and names without a `.`, fall back to `text/plain`.
///
/// ```
/// # use fileserve::http::mime::content_type;
/// assert_eq!(content_type("app.js"), "application/javascript");
/// assert_eq!(content_type("README"), "text/plain");
/// ```
pub fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map_or("", |(_, ext)| ext);

    match ext {
        "js" => "application/javascript",
        "jpg" => "image/jpg",
        "png" => "image/png",
        "html" => "text/html",
        _ => TEXT_PLAIN,
    }
}
