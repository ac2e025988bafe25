//! Canonical URL query encoding for view state.
//!
//! Defaults are omitted (`page=1`, `tab=All`, no result), so each distinct
//! navigation state has exactly one query string. The search query is not
//! part of the URL.

use url::form_urlencoded;

use super::types::{Tab, ViewState};

pub const PAGE_PARAM: &str = "page";
pub const TAB_PARAM: &str = "tab";
pub const RESULT_PARAM: &str = "result";

/// Navigation parameters decoded from (or destined for) a URL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParams {
    pub page: u32,
    pub tab: Tab,
    pub result: Option<String>,
}

impl Default for UrlParams {
    fn default() -> Self {
        Self {
            page: 1,
            tab: Tab::All,
            result: None,
        }
    }
}

impl UrlParams {
    /// Decodes a query string, with or without the leading `?`.
    ///
    /// Absent or malformed values take their defaults; the first occurrence
    /// of a repeated key wins.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut page = None;
        let mut tab = None;
        let mut result = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_PARAM if page.is_none() => page = Some(parse_page(&value)),
                TAB_PARAM if tab.is_none() => tab = Some(Tab::from_label(&value)),
                RESULT_PARAM if result.is_none() => result = Some(value.into_owned()),
                _ => {}
            }
        }

        Self {
            page: page.unwrap_or(1),
            tab: tab.unwrap_or_default(),
            result: result.filter(|id| !id.is_empty()),
        }
    }

    pub fn from_state(state: &ViewState) -> Self {
        Self {
            page: state.current_page,
            tab: state.active_tab.clone(),
            result: state.selected_result_id.clone(),
        }
    }

    /// Canonical query string: `""` for the default state, otherwise `?k=v&...`
    /// in `page`, `tab`, `result` order.
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if self.page > 1 {
            serializer.append_pair(PAGE_PARAM, &self.page.to_string());
        }
        if !self.tab.is_default() {
            serializer.append_pair(TAB_PARAM, self.tab.label());
        }
        if let Some(result) = self.result.as_deref().filter(|id| !id.is_empty()) {
            serializer.append_pair(RESULT_PARAM, result);
        }

        let encoded = serializer.finish();
        if encoded.is_empty() {
            String::new()
        } else {
            format!("?{}", encoded)
        }
    }
}

pub fn canonical_query(state: &ViewState) -> String {
    UrlParams::from_state(state).to_query()
}

/// Normalizes a raw location query so it compares equal to canonical output:
/// a bare `?` is the empty query, and a missing `?` is added.
pub fn normalize_query(query: &str) -> String {
    let trimmed = query.strip_prefix('?').unwrap_or(query);
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("?{}", trimmed)
    }
}

fn parse_page(value: &str) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(page) if page >= 1 => page,
        _ => 1,
    }
}
