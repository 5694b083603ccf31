//! URL Locator
//!
//! Resolves navigation targets and manages the `_pjax` tracking parameter.

use crate::PjaxError;
use url::Url;

/// Query parameter that keeps partial responses apart from full pages in caches
pub const PJAX_PARAM: &str = "_pjax";

/// Resolve `href` against the document location
pub fn resolve(base: &Url, href: &str) -> Result<Url, PjaxError> {
    let href = href.trim();
    if href.is_empty() {
        return Ok(base.clone());
    }
    Ok(base.join(href)?)
}

/// Remove every `_pjax` pair from the query, leaving the rest untouched
pub fn strip_tracking(url: &Url) -> Url {
    let mut url = url.clone();
    let Some(query) = url.query() else {
        return url;
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(PJAX_PARAM))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept.join("&");
        url.set_query(Some(&query));
    }
    url
}

/// Whether the URL carries the tracking parameter
pub fn has_tracking(url: &Url) -> bool {
    url.query_pairs().any(|(key, _)| key == PJAX_PARAM)
}

/// Non-empty fragment identifier, without the `#`
pub fn anchor(url: &Url) -> Option<&str> {
    url.fragment().filter(|f| !f.is_empty())
}

/// Copy of the URL with the fragment removed
pub fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Same scheme and host name
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme() && a.host_str() == b.host_str()
}

/// Link to an anchor on the page that is already displayed
pub fn is_same_page_anchor(location: &Url, link: &Url) -> bool {
    anchor(link).is_some() && without_fragment(link) == without_fragment(location)
}

/// `page.html#`: an anchor with nothing after the hash
pub fn is_empty_anchor(location: &Url, link: &Url) -> bool {
    link.fragment() == Some("") && without_fragment(link) == without_fragment(location)
}
