//! Maps navigation requests to new view states.
//! Every transition is total: bad input degrades to a valid state, never an error.

use crate::dataset::Dataset;
use crate::projector;

use super::query::UrlParams;
use super::types::{HistoryEntry, Tab, ViewState};

/// What a transition needs to know about the data being browsed.
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    pub dataset: &'a Dataset,
    pub page_size: usize,
}

impl<'a> NavContext<'a> {
    pub fn new(dataset: &'a Dataset, page_size: usize) -> Self {
        Self { dataset, page_size }
    }

    pub fn total_pages(&self, tab: &Tab) -> u32 {
        projector::total_pages(
            projector::filtered_count(&self.dataset.results, tab),
            self.page_size,
        )
    }

    /// Clamps a page into `[1, total_pages]`; an empty filter still has page 1.
    pub fn clamp_page(&self, tab: &Tab, page: u32) -> u32 {
        page.clamp(1, self.total_pages(tab).max(1))
    }

    /// Platform tabs must name a platform present in the dataset.
    pub fn resolve_tab(&self, tab: Tab) -> Tab {
        match tab.platform() {
            Some(platform) if !self.dataset.has_platform(platform) => {
                tracing::debug!(tab = %platform, "Unknown tab; falling back to default");
                Tab::All
            }
            _ => tab,
        }
    }

    pub fn resolve_result(&self, id: Option<String>) -> Option<String> {
        match id {
            Some(id) if self.dataset.contains(&id) => Some(id),
            Some(id) => {
                tracing::debug!(result_id = %id, "Unknown result id; treating as no selection");
                None
            }
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    SetQuery(String),
    SetTab(Tab),
    SetPage(u32),
    SelectResult(String),
    ClearResult,
    RestoreFromUrl(UrlParams),
    RestoreFromHistoryEntry(HistoryEntry),
}

impl Transition {
    pub fn apply(self, current: &ViewState, ctx: &NavContext<'_>) -> ViewState {
        let mut next = current.clone();
        match self {
            Transition::SetQuery(query) => next.search_query = query,
            Transition::SetTab(tab) => {
                next.active_tab = ctx.resolve_tab(tab);
                next.current_page = 1;
            }
            Transition::SetPage(page) => {
                let clamped = ctx.clamp_page(&next.active_tab, page);
                if clamped != page {
                    tracing::debug!(requested = page, clamped, "Page out of range; clamped");
                }
                next.current_page = clamped;
            }
            Transition::SelectResult(id) => next.selected_result_id = ctx.resolve_result(Some(id)),
            Transition::ClearResult => next.selected_result_id = None,
            Transition::RestoreFromUrl(params) => {
                restore(&mut next, params.page, params.tab, params.result, ctx)
            }
            Transition::RestoreFromHistoryEntry(entry) => restore(
                &mut next,
                entry.page,
                Tab::from_label(&entry.tab),
                entry.result_id,
                ctx,
            ),
        }
        next
    }
}

fn restore(
    state: &mut ViewState,
    page: u32,
    tab: Tab,
    result: Option<String>,
    ctx: &NavContext<'_>,
) {
    state.active_tab = ctx.resolve_tab(tab);
    state.current_page = ctx.clamp_page(&state.active_tab, page);
    state.selected_result_id = ctx.resolve_result(result);
}
