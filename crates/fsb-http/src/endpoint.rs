//! Endpoint URL construction.

use url::Url;

use crate::error::HttpResult;

/// Build `<base>/<endpoint>/<segments...>`.
///
/// `path` is split on `/` and every segment is percent-encoded on its own,
/// so file names with spaces, `?` or `#` survive the trip. Empty segments
/// are dropped.
pub fn endpoint_url(base: &Url, endpoint: &str, path: &str) -> HttpResult<Url> {
    let mut url = base.as_str().trim_end_matches('/').to_string();
    url.push('/');
    url.push_str(endpoint);

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }

    Ok(Url::parse(&url)?)
}
