//! Pagination cursors carried by the `link` and `x-total-count` response
//! headers.
//!
//! A link header looks like
//! `</api/books?page=1&size=20>; rel="next",</api/books?page=4&size=20>; rel="last"`
//! and is reduced to a map of `rel` name to page number.

use crate::core::LinkHeaderError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

lazy_static! {
    static ref LINK_URL: Regex = Regex::new(r"<(.*)>").expect("link url pattern is valid");
    static ref LINK_REL: Regex = Regex::new(r#"rel="(.*)""#).expect("link rel pattern is valid");
}

pub const REL_NEXT: &str = "next";
pub const REL_PREV: &str = "prev";
pub const REL_FIRST: &str = "first";
pub const REL_LAST: &str = "last";

/// Page cursors keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, u64>);

impl Links {
    /// Cursor state of a slice that has not loaded anything yet.
    pub fn initial() -> Self {
        let mut links = Self::default();
        links.insert(REL_NEXT, 0);
        links
    }

    pub fn insert(&mut self, rel: impl Into<String>, page: u64) {
        self.0.insert(rel.into(), page);
    }

    pub fn get(&self, rel: &str) -> Option<u64> {
        self.0.get(rel).copied()
    }

    pub fn next(&self) -> Option<u64> {
        self.get(REL_NEXT)
    }

    pub fn prev(&self) -> Option<u64> {
        self.get(REL_PREV)
    }

    pub fn first(&self) -> Option<u64> {
        self.get(REL_FIRST)
    }

    pub fn last(&self) -> Option<u64> {
        self.get(REL_LAST)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the collection fits on a single page.
    pub fn is_single_page(&self) -> bool {
        self.first() == self.last()
    }
}

/// Parses an RFC 5988 style `link` header into page cursors.
///
/// Relations whose URL carries no `page` parameter are skipped.
pub fn parse_header_for_links(header: &str) -> Result<Links, LinkHeaderError> {
    if header.trim().is_empty() {
        return Err(LinkHeaderError::Empty);
    }

    let mut links = Links::default();
    for part in split_link_values(header) {
        let section: Vec<&str> = part.split(';').collect();
        if section.len() != 2 {
            return Err(LinkHeaderError::MalformedSection(part.trim().to_string()));
        }

        let url = LINK_URL.replace(section[0], "$1");
        let name = LINK_REL.replace(section[1], "$1");

        if let Some(page) = page_param(url.trim())? {
            links.insert(name.trim(), page);
        }
    }

    Ok(links)
}

// Commas may appear inside a link target (`sort=id,asc`), so a new value
// only starts at a comma followed by `<`.
fn split_link_values(header: &str) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for chunk in header.split(',') {
        match values.last_mut() {
            Some(current) if !chunk.trim_start().starts_with('<') => {
                current.push(',');
                current.push_str(chunk);
            }
            _ => values.push(chunk.to_string()),
        }
    }
    values
}

fn page_param(url: &str) -> Result<Option<u64>, LinkHeaderError> {
    let Some((_, query)) = url.split_once('?') else {
        return Ok(None);
    };

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == "page" {
            return value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| LinkHeaderError::InvalidPage(value.to_string()));
        }
    }

    Ok(None)
}

/// Merges a freshly fetched page into the rows already on screen.
///
/// The new page replaces the old rows when nothing is loaded yet or the
/// collection fits on one page; otherwise it is appended.
pub fn load_more_data_when_scrolled<T: Clone>(old: &[T], new: Vec<T>, links: &Links) -> Vec<T> {
    if old.is_empty() || links.is_single_page() {
        return new;
    }

    let mut merged = Vec::with_capacity(old.len() + new.len());
    merged.extend_from_slice(old);
    merged.extend(new);
    merged
}

/// Reads `x-total-count`, if present and numeric.
pub fn parse_total_count(header: Option<&str>) -> Option<u64> {
    header.and_then(|raw| raw.trim().parse::<u64>().ok())
}
