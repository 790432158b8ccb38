//! Utility functions for file naming and submission parsing

use regex::Regex;
use std::sync::LazyLock;

/// Base name used when a URL yields no usable file name
pub const DEFAULT_FILE_NAME: &str = "file.jpg";

/// Extension appended to names that have none
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Maximum length of a sanitized file name
pub const MAX_FILE_NAME_LEN: usize = 200;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[^A-Za-z0-9._\-]").expect("static regex is valid")
});

/// Replace every character outside `[A-Za-z0-9._-]` with `_` and cap the length
///
/// # Examples
///
/// ```
/// use image_zip_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
/// assert_eq!(sanitize_filename(""), "file.jpg");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return DEFAULT_FILE_NAME.to_string();
    }

    let mut cleaned = UNSAFE_CHARS.replace_all(name, "_").into_owned();
    // Only ASCII survives the replacement, so byte truncation is char-safe
    cleaned.truncate(MAX_FILE_NAME_LEN);
    cleaned
}

/// Derive a safe file name from a source URL
///
/// - Drops the query and fragment and takes the final path segment as typed,
///   without percent-decoding or re-encoding it
/// - Substitutes [`DEFAULT_FILE_NAME`] when the segment is empty
/// - Appends `.jpg` when the segment has no extension
/// - Sanitizes the result with [`sanitize_filename`]
///
/// Never fails: anything that does not parse as a URL yields the default name.
///
/// # Examples
///
/// ```
/// use image_zip_dl::utils::extract_filename_from_url;
///
/// assert_eq!(extract_filename_from_url("https://cdn.example.com/a/2025_15378.jpg?sig=abc"), "2025_15378.jpg");
/// assert_eq!(extract_filename_from_url("http://host/b"), "b.jpg");
/// assert_eq!(extract_filename_from_url("http://host/"), "file.jpg");
/// assert_eq!(extract_filename_from_url("not a url"), "file.jpg");
/// ```
#[must_use]
pub fn extract_filename_from_url(url: &str) -> String {
    if url::Url::parse(url).is_err() {
        return sanitize_filename(DEFAULT_FILE_NAME);
    }

    let basename = raw_path(url).rsplit('/').next().unwrap_or_default();

    let name = if basename.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else if !basename.contains('.') {
        format!("{basename}.{DEFAULT_EXTENSION}")
    } else {
        basename.to_string()
    };

    sanitize_filename(&name)
}

/// Path component of `url` exactly as written
///
/// `Url::path` percent-encodes spaces and non-ASCII characters, which would
/// then be sanitized as `_20`-style noise instead of one `_` per character.
fn raw_path(url: &str) -> &str {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    let Some((_scheme, rest)) = url[..end].split_once(':') else {
        return "";
    };
    match rest.strip_prefix("//") {
        Some(authority_and_path) => authority_and_path
            .find('/')
            .map_or("", |start| &authority_and_path[start..]),
        None => rest,
    }
}

/// Split a file name into stem and extension (extension keeps its dot)
///
/// Leading dots belong to the stem, so `.hidden` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Make `candidate` unique against names already taken within a task
///
/// On collision, appends `_1`, `_2`, ... before the extension until the name
/// is free: `img.jpg` → `img_1.jpg` → `img_2.jpg`.
///
/// # Examples
///
/// ```
/// use image_zip_dl::utils::unique_name;
///
/// let taken = ["img.jpg", "img_1.jpg"];
/// assert_eq!(unique_name("img.jpg", |n| taken.contains(&n)), "img_2.jpg");
/// assert_eq!(unique_name("other.png", |n| taken.contains(&n)), "other.png");
/// ```
#[must_use]
pub fn unique_name(candidate: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(candidate) {
        return candidate.to_string();
    }

    let (stem, extension) = split_extension(candidate);
    (1u64..)
        .map(|suffix| format!("{stem}_{suffix}{extension}"))
        .find(|name| !is_taken(name))
        .unwrap_or_else(|| candidate.to_string())
}

/// Split raw newline-separated submission text into URLs
///
/// Lines are trimmed; blank lines are dropped.
#[must_use]
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // extract_filename_from_url
    // =========================================================================

    #[test]
    fn query_string_is_dropped() {
        assert_eq!(
            extract_filename_from_url("https://photo.example.jp/img/2025_15378.jpg?x=1&y=2"),
            "2025_15378.jpg"
        );
    }

    #[test]
    fn missing_extension_gets_jpg() {
        assert_eq!(extract_filename_from_url("http://host/b"), "b.jpg");
    }

    #[test]
    fn empty_segment_falls_back_to_default() {
        assert_eq!(extract_filename_from_url("http://host/dir/"), "file.jpg");
        assert_eq!(extract_filename_from_url("http://host"), "file.jpg");
    }

    #[test]
    fn unparseable_input_falls_back_to_default() {
        assert_eq!(extract_filename_from_url(""), "file.jpg");
        assert_eq!(extract_filename_from_url("::::"), "file.jpg");
        assert_eq!(extract_filename_from_url("relative/path.png"), "file.jpg");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(
            extract_filename_from_url("http://host/my%20pic(1).png"),
            "my_20pic_1_.png"
        );
    }

    #[test]
    fn characters_are_sanitized_as_typed_not_percent_encoded() {
        assert_eq!(extract_filename_from_url("http://host/my pic.png"), "my_pic.png");
        assert_eq!(extract_filename_from_url("http://host/日本.jpg"), "__.jpg");
        assert_eq!(extract_filename_from_url("http://host/my%20pic.png"), "my_20pic.png");
    }

    #[test]
    fn fragment_and_authority_are_not_part_of_the_name() {
        assert_eq!(
            extract_filename_from_url("https://user:pw@cdn.example.com:8443/a/b/c.webp#top"),
            "c.webp"
        );
        assert_eq!(
            extract_filename_from_url("https://cdn.example.com/a/photo#frag.png"),
            "photo.jpg"
        );
        assert_eq!(extract_filename_from_url("https://cdn.example.com?x=/y.png"), "file.jpg");
    }

    #[test]
    fn long_names_are_truncated() {
        let long = "a".repeat(500);
        let name = extract_filename_from_url(&format!("http://host/{long}.png"));
        assert_eq!(name.len(), MAX_FILE_NAME_LEN);
        assert!(name.chars().all(|c| c == 'a'));
    }

    #[test]
    fn sanitized_names_only_contain_safe_characters() {
        let name = sanitize_filename("ü/..\\<>:|?*name.jpeg");
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        );
    }

    // =========================================================================
    // unique_name
    // =========================================================================

    #[test]
    fn collisions_get_incrementing_suffix_before_extension() {
        let mut taken: Vec<String> = Vec::new();
        for _ in 0..3 {
            let name = unique_name("img.jpg", |n| taken.iter().any(|t| t == n));
            taken.push(name);
        }
        assert_eq!(taken, vec!["img.jpg", "img_1.jpg", "img_2.jpg"]);
    }

    #[test]
    fn suffix_goes_after_last_dot_only() {
        let taken = ["archive.tar.gz"];
        assert_eq!(
            unique_name("archive.tar.gz", |n| taken.contains(&n)),
            "archive.tar_1.gz"
        );
    }

    #[test]
    fn names_without_extension_get_plain_suffix() {
        let taken = [".hidden"];
        assert_eq!(unique_name(".hidden", |n| taken.contains(&n)), ".hidden_1");
    }

    #[test]
    fn suffix_skips_names_already_taken_by_other_urls() {
        // img_1.jpg was submitted literally before the second img.jpg
        let taken = ["img.jpg", "img_1.jpg"];
        assert_eq!(unique_name("img.jpg", |n| taken.contains(&n)), "img_2.jpg");
    }

    // =========================================================================
    // parse_url_list
    // =========================================================================

    #[test]
    fn url_list_trims_and_drops_blank_lines() {
        let raw = "  http://a/1.png \n\n\r\nhttp://a/2.png\r\n   \n";
        assert_eq!(
            parse_url_list(raw),
            vec!["http://a/1.png".to_string(), "http://a/2.png".to_string()]
        );
    }

    #[test]
    fn whitespace_only_submission_is_empty() {
        assert!(parse_url_list(" \n\t\n").is_empty());
    }
}
