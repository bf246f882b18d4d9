//! Field validators shared by input structs.

use validator::ValidationError;

/// An image reference: an absolute http(s) URL or a path served by this
/// service, such as `/api/files/news/2025/01/01/x.png`.
pub fn image_url(value: &str) -> Result<(), ValidationError> {
    if value.len() > 2048 {
        return Err(ValidationError::new("image_url_too_long"));
    }
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(());
    }
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("image_url")),
    }
}

/// Every entry must pass [`image_url`].
pub fn image_urls(values: &[String]) -> Result<(), ValidationError> {
    if values.len() > 20 {
        return Err(ValidationError::new("too_many_images"));
    }
    values.iter().try_for_each(|v| image_url(v))
}
