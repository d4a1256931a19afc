//! Input validation for generation requests.

use crate::models::{ImageSource, NormalizedImage, PoemInput};
use crate::{Error, Result};
use reqwest::Url;

/// Check that a request carries a usable image and classify it.
///
/// Blank fields count as absent. Filled fields are used exactly as given, so
/// an inline image with surrounding whitespace is rejected. When both fields
/// are filled the inline image is used and the URL is ignored, but it must
/// still be well formed.
pub fn validate_input(input: &PoemInput) -> Result<ImageSource> {
    let inline = non_blank(input.inline_image.as_deref());
    let url = non_blank(input.image_url.as_deref())
        .map(parse_image_url)
        .transpose()?;

    match (inline, url) {
        (Some(data_uri), _) => Ok(ImageSource::Inline(NormalizedImage::parse(data_uri)?)),
        (None, Some(url)) => Ok(ImageSource::Remote(url)),
        (None, None) => Err(Error::Validation(
            "Either inlineImage or imageUrl must be provided.".to_string(),
        )),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_image_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::Validation(format!("Invalid image URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(Error::Validation(format!(
            "Image URL must be an absolute http(s) URL: {}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_both_fields_fails() {
        let err = validate_input(&PoemInput::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let input = PoemInput {
            inline_image: Some("   ".to_string()),
            image_url: Some(String::new()),
        };
        assert!(matches!(validate_input(&input), Err(Error::Validation(_))));
    }

    #[test]
    fn test_inline_image_passes_through() {
        let source = validate_input(&PoemInput::inline("data:image/png;base64,iVBORw0K")).unwrap();
        match source {
            ImageSource::Inline(image) => {
                assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0K")
            }
            other => panic!("expected inline source, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_url_is_parsed() {
        let source = validate_input(&PoemInput::url("https://x/y.png")).unwrap();
        assert_eq!(
            source,
            ImageSource::Remote(Url::parse("https://x/y.png").unwrap())
        );
    }

    #[test]
    fn test_relative_or_non_http_url_fails() {
        assert!(validate_input(&PoemInput::url("/images/y.png")).is_err());
        assert!(validate_input(&PoemInput::url("ftp://x/y.png")).is_err());
        assert!(validate_input(&PoemInput::url("not a url")).is_err());
    }

    #[test]
    fn test_inline_wins_over_url() {
        let input = PoemInput {
            inline_image: Some("data:image/jpeg;base64,/9j/".to_string()),
            image_url: Some("https://x/y.png".to_string()),
        };
        assert!(matches!(
            validate_input(&input).unwrap(),
            ImageSource::Inline(_)
        ));
    }

    #[test]
    fn test_malformed_url_fails_even_with_inline_image() {
        let input = PoemInput {
            inline_image: Some("data:image/jpeg;base64,/9j/".to_string()),
            image_url: Some("nope".to_string()),
        };
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_inline_image_with_surrounding_whitespace_fails() {
        let input = PoemInput::inline(" data:image/png;base64,AA== ");
        assert!(matches!(validate_input(&input), Err(Error::Validation(_))));
    }

    #[test]
    fn test_inline_non_image_fails() {
        let input = PoemInput::inline("data:text/plain;base64,aGVsbG8=");
        assert!(matches!(validate_input(&input), Err(Error::Validation(_))));
    }
}
