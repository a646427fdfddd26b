use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::error::PageError;

/// Get a parameter by name from a page URL.
///
/// `None` when the key does not appear, `Some("")` when it appears without a
/// value. Values are percent-decoded and `+` reads as a space.
pub fn get_parameter_by_name(name: &str, url: &str) -> Option<String> {
    let pattern = format!(r"[?&]{}(=([^&#]*)|&|#|$)", regex::escape(name));
    // `name` is escaped, compiling cannot fail
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(url)?;

    let raw = match caps.get(2) {
        Some(m) if !m.as_str().is_empty() => m.as_str(),
        _ => return Some(String::new()),
    };

    let raw = raw.replace('+', " ");
    let decoded: Cow<str> = percent_decode_str(&raw).decode_utf8_lossy();
    Some(decoded.into_owned())
}

/// Resolve the restaurant id of the page at `url`.
pub fn resolve_restaurant_id(url: &str) -> Result<i64, PageError> {
    let raw = match get_parameter_by_name("id", url) {
        Some(id) if !id.is_empty() => id,
        _ => return Err(PageError::MissingId),
    };

    raw.trim()
        .parse()
        .map_err(|_| PageError::InvalidId(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_absent_and_empty() {
        assert_eq!(
            get_parameter_by_name("id", "https://x/y?id=42").as_deref(),
            Some("42")
        );
        assert_eq!(get_parameter_by_name("id", "https://x/y"), None);
        assert_eq!(
            get_parameter_by_name("id", "https://x/y?id=").as_deref(),
            Some("")
        );
    }

    #[test]
    fn valueless_key_followed_by_other_params() {
        assert_eq!(
            get_parameter_by_name("id", "https://x/y?id&page=2").as_deref(),
            Some("")
        );
        assert_eq!(
            get_parameter_by_name("id", "https://x/y?id#top").as_deref(),
            Some("")
        );
    }

    #[test]
    fn picks_the_named_key_only() {
        let url = "https://x/y?page=3&id=7#reviews";
        assert_eq!(get_parameter_by_name("id", url).as_deref(), Some("7"));
        assert_eq!(get_parameter_by_name("page", url).as_deref(), Some("3"));
        assert_eq!(get_parameter_by_name("pid", "https://x/y?id=1"), None);
    }

    #[test]
    fn decodes_plus_and_percent() {
        let url = "https://x/y?q=caf%C3%A9+and%20bar";
        assert_eq!(
            get_parameter_by_name("q", url).as_deref(),
            Some("café and bar")
        );
    }

    #[test]
    fn escapes_metacharacters_in_name() {
        let url = "https://x/y?tags[]=thai&tagsX=no";
        assert_eq!(
            get_parameter_by_name("tags[]", url).as_deref(),
            Some("thai")
        );
        assert_eq!(get_parameter_by_name("tags.", url), None);
    }

    #[test]
    fn resolves_ids() {
        assert_eq!(resolve_restaurant_id("/restaurant.html?id=5").unwrap(), 5);
        assert!(matches!(
            resolve_restaurant_id("/restaurant.html"),
            Err(PageError::MissingId)
        ));
        assert!(matches!(
            resolve_restaurant_id("/restaurant.html?id="),
            Err(PageError::MissingId)
        ));
        assert!(matches!(
            resolve_restaurant_id("/restaurant.html?id=abc"),
            Err(PageError::InvalidId(id)) if id == "abc"
        ));
    }
}
