//! Response Extraction
//!
//! Turns a fetched payload into the pieces the engine splices into the
//! page: canonical URL, title, container content, external scripts and
//! head metadata. Extraction is pure; whether the result is usable is
//! decided by the caller.

use crate::locator;
use crate::meta::{value_attr_for, HeadMeta};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Canonical URL override sent by the server
pub const HEADER_URL: &str = "X-PJAX-URL";
/// Fragment selector override sent by the server
pub const HEADER_CONTAINER: &str = "X-PJAX-Container";
/// Server layout version
pub const HEADER_VERSION: &str = "X-PJAX-Version";

/// Link relations left alone by head reconciliation
const SKIPPED_RELS: [&str; 2] = ["stylesheet", "prefetch"];

/// Raw transport response
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// First header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, invalid sequences replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// External script pulled out of fetched content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    pub src: String,
    pub script_type: Option<String>,
}

impl ScriptTag {
    fn from_element(el: ElementRef<'_>) -> Option<Self> {
        let src = el.value().attr("src")?;
        Some(Self {
            src: src.to_string(),
            script_type: el.value().attr("type").map(str::to_string),
        })
    }
}

/// Result of extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Canonical URL: no tracking parameter, no fragment
    pub url: Url,
    pub title: Option<String>,
    /// HTML for the container; `None` means nothing usable was found
    pub content: Option<String>,
    /// External scripts to run after the splice, in order
    pub scripts: Vec<ScriptTag>,
    pub meta: Option<HeadMeta>,
}

impl ExtractedPage {
    fn empty(url: Url) -> Self {
        Self {
            url,
            title: None,
            content: None,
            scripts: Vec::new(),
            meta: None,
        }
    }
}

/// Canonical URL for a response: server override, else the request URL
pub fn canonical_url(headers: &[(String, String)], request_url: &Url) -> Url {
    let url = find_header(headers, HEADER_URL)
        .and_then(|href| request_url.join(href).ok())
        .unwrap_or_else(|| request_url.clone());
    locator::without_fragment(&locator::strip_tracking(&url))
}

/// Extract a page from a response.
///
/// `fragment` is the request-level selector; it wins over the
/// `X-PJAX-Container` header. `body` selects the whole body.
pub fn extract_page(
    response: &RawResponse,
    request_url: &Url,
    fragment: Option<&str>,
) -> ExtractedPage {
    let url = canonical_url(&response.headers, request_url);
    let body = response.text();

    let fragment = fragment
        .map(str::to_string)
        .or_else(|| response.header(HEADER_CONTAINER).map(str::to_string));

    let (document, layout) = if body.to_ascii_lowercase().contains("<html") {
        (Html::parse_document(&body), Layout::Document)
    } else if let Some((open, close, inner)) = table_wrap(&body) {
        let wrapped = format!("{open}{body}{close}");
        (Html::parse_fragment(&wrapped), Layout::Table(inner))
    } else {
        (Html::parse_fragment(&body), Layout::Fragment)
    };
    build_page(url, document, layout, fragment.as_deref())
}

/// Where the page body sits in a parsed response
#[derive(Debug, Clone, Copy)]
enum Layout {
    Document,
    Fragment,
    /// Table parts parsed inside a wrapper; the body is the innermost wrapper
    Table(&'static str),
}

/// Wrapper markup for bare table parts, which the parser drops outside a table
fn table_wrap(html: &str) -> Option<(&'static str, &'static str, &'static str)> {
    let wrap = match first_tag(html)?.as_str() {
        "thead" | "tbody" | "tfoot" | "caption" | "colgroup" => ("<table>", "</table>", "table"),
        "col" => ("<table><colgroup>", "</colgroup></table>", "table > colgroup"),
        "tr" => ("<table><tbody>", "</tbody></table>", "table > tbody"),
        "td" | "th" => ("<table><tbody><tr>", "</tr></tbody></table>", "table > tbody > tr"),
        _ => return None,
    };
    Some(wrap)
}

fn first_tag(html: &str) -> Option<String> {
    let (start, _) = html
        .match_indices('<')
        .find(|(i, _)| html[i + 1..].starts_with(|c: char| c.is_ascii_alphabetic()))?;
    let name: String = html[start + 1..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    Some(name.to_ascii_lowercase())
}

fn build_page(
    url: Url,
    mut document: Html,
    layout: Layout,
    fragment: Option<&str>,
) -> ExtractedPage {
    let mut page = ExtractedPage::empty(url);

    let (selected, doomed, inline) = {
        let root = document.root_element();
        let body = match layout {
            Layout::Document => select_all(root, "body").into_iter().next(),
            Layout::Fragment => Some(root),
            Layout::Table(css) => select_all(root, css).into_iter().next(),
        };
        let Some(body) = body.filter(|body| body.children().next().is_some()) else {
            return page;
        };

        page.title = select_all(root, "title")
            .last()
            .map(|title| title.text().collect::<String>())
            .filter(|title| !title.trim().is_empty());

        let selected = match fragment {
            None | Some("body") => Some(body),
            Some(css) => match Selector::parse(css) {
                Ok(selector) => body.select(&selector).next().inspect(|el| {
                    if page.title.is_none() {
                        page.title = el
                            .value()
                            .attr("title")
                            .or_else(|| el.value().attr("data-title"))
                            .map(str::to_string);
                    }
                }),
                Err(_) => {
                    tracing::warn!("Unusable fragment selector {:?}", css);
                    None
                }
            },
        };

        // Titles and external scripts are cut from the parsed tree in place
        let mut doomed = Vec::new();
        if let Some(el) = selected {
            let external = select_all(el, "script[src]");
            page.scripts = external
                .iter()
                .copied()
                .filter_map(ScriptTag::from_element)
                .collect();
            doomed.extend(select_all(el, "title").into_iter().chain(external).map(|el| el.id()));
        }

        let head = match layout {
            Layout::Document => select_all(root, "head").into_iter().next(),
            _ => None,
        };
        let mut inline = String::new();
        if let Some(head) = head {
            let (local, external): (Vec<_>, Vec<_>) = select_all(head, "script")
                .into_iter()
                .partition(|script| script.value().attr("src").is_none());
            inline = local.iter().map(|script| script.html()).collect();

            let mut scripts: Vec<ScriptTag> = external
                .into_iter()
                .filter_map(ScriptTag::from_element)
                .collect();
            scripts.append(&mut page.scripts);
            page.scripts = scripts;

            let meta = grab_meta(head);
            if !meta.is_empty() {
                page.meta = Some(meta);
            }
        }

        (selected.map(|el| el.id()), doomed, inline)
    };

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let selected = selected
        .and_then(|id| document.tree.get(id))
        .and_then(ElementRef::wrap);
    if let Some(el) = selected {
        let mut content = inline;
        content.push_str(&el.inner_html());
        page.content = Some(content);
    }

    page.title = page
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    page
}

/// Collect `meta`/`link` descriptors from a head element
pub fn grab_meta(head: ElementRef<'_>) -> HeadMeta {
    const SEARCH: [(&str, &str); 4] = [
        ("itemprop", "meta"),
        ("property", "meta"),
        ("name", "meta"),
        ("rel", "link"),
    ];

    let mut meta = HeadMeta::new();
    for (attr, tag) in SEARCH {
        let value_attr = value_attr_for(tag);
        for el in select_all(head, &format!("{tag}[{attr}]")) {
            let key = el.value().attr(attr).unwrap_or_default();
            if attr == "rel" && SKIPPED_RELS.iter().any(|rel| rel.eq_ignore_ascii_case(key)) {
                continue;
            }
            if let Some(value) = el.value().attr(value_attr) {
                meta.insert(tag, attr, key, value);
            }
        }
    }
    meta
}

/// Head metadata of a complete HTML document
pub fn document_meta(html: &str) -> HeadMeta {
    let document = Html::parse_document(html);
    select_all(document.root_element(), "head")
        .into_iter()
        .next()
        .map(grab_meta)
        .unwrap_or_default()
}

/// Layout version declared with `<meta http-equiv="X-PJAX-VERSION">`
pub fn find_version(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    select_all(document.root_element(), "meta[http-equiv]")
        .into_iter()
        .find(|el| {
            el.value()
                .attr("http-equiv")
                .is_some_and(|name| name.eq_ignore_ascii_case(HEADER_VERSION))
        })
        .and_then(|el| el.value().attr("content").map(str::to_string))
}

fn select_all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => root.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}
