use unicode_width::UnicodeWidthChar;

use url::{ParseError, Url};

/// Safely truncate a string, ensuring it is not truncated in the middle of multi-byte characters
///
/// This function will:
/// 1. Correctly handle Unicode characters (including CJK, emoji, etc.)
/// 2. Add ellipsis when maximum length is reached
/// 3. Ensure the output string's display width does not exceed the specified length
#[cfg_attr(not(feature = "logging"), allow(dead_code))]
pub fn truncate_str(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;

    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Host of a URL with its explicit port, e.g. `example.com:8080`.
pub fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Same as [`host_with_port`] for a URL that has not been parsed yet.
pub fn pickup_host_from_url(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(host_with_port)
}

/// `scheme://host[:port]/` of a URL.
pub fn origin_of(url: &Url) -> Result<Url, ParseError> {
    let host = url.host_str().ok_or(ParseError::EmptyHost)?;
    let port = url.port().map(|x| format!(":{x}")).unwrap_or_default();

    Url::parse(&format!("{}://{host}{port}/", url.scheme()))
}

/// Resolve `href` against `base`; an unparseable combination yields `href` untouched.
pub fn resolve_url(base: Option<&Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}
