// Image link resizing
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Sizes the image host can render, ascending
pub const SUPPORTED_SIZES: [u32; 6] = [160, 320, 480, 720, 1000, 1500];

pub const DEFAULT_IMAGE_SIZE: u32 = 720;

/// `_UL320_` / `_SX679_` style tokens: marker, digits, terminator
static SIZE_TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(_UL|_SX)(\d+)(_)").ok());

/// Snap a requested size to the nearest supported one; the smaller size wins ties.
pub fn validate_size(requested: i64) -> u32 {
    SUPPORTED_SIZES
        .iter()
        .copied()
        .min_by_key(|&size| i64::from(size).abs_diff(requested))
        .unwrap_or(DEFAULT_IMAGE_SIZE)
}

/// Rewrite the first size token of `link` to the validated `requested` size.
/// Links without a size token come back untouched.
pub fn resize(link: &str, requested: i64) -> Cow<'_, str> {
    let Some(pattern) = SIZE_TOKEN.as_ref() else {
        return Cow::Borrowed(link);
    };
    let size = validate_size(requested);
    pattern.replacen(link, 1, |caps: &regex::Captures<'_>| {
        format!("{}{}{}", &caps[1], size, &caps[3])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_members_unchanged() {
        for size in SUPPORTED_SIZES {
            assert_eq!(validate_size(i64::from(size)), size);
        }
    }

    #[test]
    fn test_validate_nearest() {
        assert_eq!(validate_size(500), 480);
        assert_eq!(validate_size(0), 160);
        assert_eq!(validate_size(-50), 160);
        assert_eq!(validate_size(5000), 1500);
        assert_eq!(validate_size(i64::MIN), 160);
        assert_eq!(validate_size(i64::MAX), 1500);
        assert_eq!(validate_size(1200), 1000);
    }

    #[test]
    fn test_validate_tie_prefers_smaller() {
        assert_eq!(validate_size(400), 320);
        assert_eq!(validate_size(600), 480);
        assert_eq!(validate_size(1250), 1000);
    }

    #[test]
    fn test_resize_ul_token() {
        let link = "https://m.media-amazon.com/images/I/71cv73eEBWL._AC_UL320_.jpg";
        assert_eq!(
            resize(link, 1000),
            "https://m.media-amazon.com/images/I/71cv73eEBWL._AC_UL1000_.jpg"
        );
    }

    #[test]
    fn test_resize_sx_token_and_snapping() {
        let link = "https://m.media-amazon.com/images/I/61abc._AC_SX679_.jpg";
        assert_eq!(resize(link, 500), "https://m.media-amazon.com/images/I/61abc._AC_SX480_.jpg");
    }

    #[test]
    fn test_resize_only_first_token() {
        let link = "http://x/a._UL160_._SX160_.jpg";
        assert_eq!(resize(link, 720), "http://x/a._UL720_._SX160_.jpg");
    }

    #[test]
    fn test_resize_without_token() {
        let link = "http://194.238.23.194/epicsum/videos/flower.mp4";
        assert!(matches!(resize(link, 720), Cow::Borrowed(_)));
        assert_eq!(resize("http://x/a._UL_.jpg", 720), "http://x/a._UL_.jpg");
    }
}
