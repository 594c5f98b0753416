use crate::UrlError;
use url::Url;

/// Normalizes a raw URL, optionally resolving it against a base document URL.
///
/// # Normalization Steps
///
/// 1. Resolve relative references against `base` (when given); reject if
///    malformed
/// 2. Reject non-`http(s)` schemes
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
///
/// Scheme and host lowercasing and default-port removal are performed by the
/// `url` crate during parsing, so the returned URL is fully canonical: two
/// spellings of the same resource compare equal as strings.
///
/// # Examples
///
/// ```
/// use petrel::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/a/").unwrap();
/// let url = normalize_url("../b#frag", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let mut url = match base {
        Some(base) => base
            .join(raw.trim())
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        None => Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}
