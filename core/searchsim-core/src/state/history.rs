//! Browser-style history, kept in step with the view state.
//!
//! `NavigationStack` models the back/forward stack independently of any
//! platform API. A push drops whatever was forward of the cursor (as browsers
//! do), back/forward only move the cursor, and `replace_current` rewrites the
//! entry under the cursor in place. `HistorySync` decides when a push or a
//! replace is needed and how an entry is turned back into a view state.
//!
//! User actions push. Restoring an entry (back, forward, a typed URL) never
//! pushes: if the restored view does not match the entry's URL (clamped page,
//! unknown tab, stray parameters), the entry is rewritten to the canonical URL
//! so the forward stack survives.

use super::query::{canonical_query, normalize_query, UrlParams};
use super::transition::Transition;
use super::types::{HistoryEntry, ViewState};

/// One navigation entry: the URL query plus the structured payload, if the
/// entry was pushed by `HistorySync`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub query: String,
    pub payload: Option<HistoryEntry>,
}

impl NavEntry {
    /// An entry created outside the app: typed URL, bookmark, initial load.
    pub fn external(query: &str) -> Self {
        Self {
            query: normalize_query(query),
            payload: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavigationStack {
    entries: Vec<NavEntry>,
    cursor: usize,
}

impl NavigationStack {
    pub fn new(initial: NavEntry) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &NavEntry {
        &self.entries[self.cursor]
    }

    pub fn push(&mut self, entry: NavEntry) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
    }

    /// Rewrites the entry under the cursor. Neighbouring entries are untouched.
    pub fn replace_current(&mut self, entry: NavEntry) {
        self.entries[self.cursor] = entry;
    }

    pub fn back(&mut self) -> Option<&NavEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&NavEntry> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
pub struct HistorySync {
    stack: NavigationStack,
}

impl HistorySync {
    /// Starts tracking history at the page's initial location. Nothing is
    /// pushed on mount.
    pub fn mount(location_query: &str) -> Self {
        Self {
            stack: NavigationStack::new(NavEntry::external(location_query)),
        }
    }

    pub fn current_query(&self) -> &str {
        &self.stack.current().query
    }

    /// Pushes an entry for `state` unless the current URL already encodes it.
    /// Returns whether an entry was pushed.
    pub fn reconcile(&mut self, state: &ViewState) -> bool {
        let query = canonical_query(state);
        if query == self.current_query() {
            return false;
        }

        tracing::debug!(
            from = %self.current_query(),
            to = %query,
            "Pushing history entry"
        );
        self.stack.push(NavEntry {
            query,
            payload: Some(HistoryEntry::from_state(state)),
        });
        true
    }

    /// Rewrites the current entry to the canonical URL for `state` when they
    /// differ. Used after restoring an entry; never changes the stack length.
    /// Returns whether the entry was rewritten.
    pub fn canonicalize_current(&mut self, state: &ViewState) -> bool {
        let query = canonical_query(state);
        if query == self.current_query() {
            return false;
        }

        tracing::debug!(
            from = %self.current_query(),
            to = %query,
            "Replacing history entry"
        );
        self.stack.replace_current(NavEntry {
            query,
            payload: Some(HistoryEntry::from_state(state)),
        });
        true
    }

    /// Records a navigation the app did not originate (typed URL, bookmark).
    pub fn navigate_external(&mut self, query: &str) -> NavEntry {
        let entry = NavEntry::external(query);
        self.stack.push(entry.clone());
        entry
    }

    pub fn back(&mut self) -> Option<NavEntry> {
        self.stack.back().cloned()
    }

    pub fn forward(&mut self) -> Option<NavEntry> {
        self.stack.forward().cloned()
    }

    /// The transition that restores the view for a popped entry: exact
    /// restoration from the payload when present, URL parsing otherwise.
    pub fn restore_transition(entry: &NavEntry) -> Transition {
        match &entry.payload {
            Some(payload) => Transition::RestoreFromHistoryEntry(payload.clone()),
            None => Transition::RestoreFromUrl(UrlParams::parse(&entry.query)),
        }
    }

    pub fn stack(&self) -> &NavigationStack {
        &self.stack
    }
}
