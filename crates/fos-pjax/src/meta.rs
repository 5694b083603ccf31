//! Head Metadata
//!
//! Compact description of the `<meta>` and `<link>` tags of a page head.
//! Tags are grouped by `tag>attribute>key` (for example
//! `meta>name>description`) so a later page can replace them one group at
//! a time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SEPARATOR: char = '>';

/// Attribute carrying the value of a head tag: `href` for links, else `content`
pub(crate) fn value_attr_for(tag: &str) -> &'static str {
    if tag == "link" { "href" } else { "content" }
}

/// One head tag described by the metadata map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDescriptor<'a> {
    /// `meta` or `link`
    pub tag: &'a str,
    /// Identifying attribute (`name`, `property`, `itemprop`, `rel`)
    pub attr: &'a str,
    /// Value of the identifying attribute
    pub key: &'a str,
    /// `content` for meta tags, `href` for links
    pub value: &'a str,
}

impl MetaDescriptor<'_> {
    /// Attribute that carries the value
    pub fn value_attr(&self) -> &'static str {
        value_attr_for(self.tag)
    }
}

/// Grouped head metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadMeta {
    groups: BTreeMap<String, Vec<String>>,
}

impl HeadMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; repeated keys keep every value in document order
    pub fn insert(&mut self, tag: &str, attr: &str, key: &str, value: &str) {
        let group = format!("{tag}{SEPARATOR}{attr}{SEPARATOR}{key}");
        self.groups.entry(group).or_default().push(value.to_string());
    }

    /// Values of one group
    pub fn get(&self, tag: &str, attr: &str, key: &str) -> Option<&[String]> {
        let group = format!("{tag}{SEPARATOR}{attr}{SEPARATOR}{key}");
        self.groups.get(&group).map(Vec::as_slice)
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Expand into one descriptor per tag
    pub fn descriptors(&self) -> impl Iterator<Item = MetaDescriptor<'_>> {
        self.groups.iter().flat_map(|(group, values)| {
            let mut parts = group.splitn(3, SEPARATOR);
            let tag = parts.next().unwrap_or_default();
            let attr = parts.next().unwrap_or_default();
            let key = parts.next().unwrap_or_default();
            values.iter().map(move |value| MetaDescriptor { tag, attr, key, value })
        })
    }
}
