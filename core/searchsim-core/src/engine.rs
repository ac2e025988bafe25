//! SimulationEngine - the dispatcher that drives one simulated results page.
//!
//! The engine owns everything a browser tab would hold for the page:
//! - the persona dataset,
//! - the current [`ViewState`],
//! - the [`HistorySync`] stack,
//! - a [`TrackingClient`].
//!
//! Every [`UserAction`] becomes at most one [`Transition`]. After the
//! transition the engine compares the previous and next state, runs the
//! side-effect rules in [`side_effects`], then syncs history: user actions
//! push a new entry when the URL changes, while restores (back, forward, a
//! typed URL) only rewrite the entry they landed on. Rendering reads the
//! result through [`SimulationEngine::page`].
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use searchsim_core::{SimulationEngine, UserAction, Tab};
//!
//! let mut engine = SimulationEngine::mount(dataset, "?page=2", tracker, &config);
//! engine.dispatch(UserAction::SelectTab(Tab::from_label("LinkedIn")));
//! assert_eq!(engine.current_query(), "?tab=LinkedIn");
//! ```

use crate::config::SimConfig;
use crate::dataset::{Dataset, SimResult};
use crate::projector::{self, PageToken};
use crate::state::{HistorySync, NavContext, Tab, Transition, UrlParams, ViewState};
use crate::tracking::TrackingClient;

/// Something the user did on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Search(String),
    SelectTab(Tab),
    GoToPage(u32),
    NextPage,
    PreviousPage,
    OpenResult(String),
    CloseResult,
    /// An image in the gallery strip. Tracked only; the view does not change.
    ClickImage { id: String, title: String },
    Back,
    Forward,
    /// A URL entered outside the app (typed, bookmarked).
    Navigate(String),
}

impl UserAction {
    /// Actions that land on an existing history entry instead of creating one.
    fn restores_entry(&self) -> bool {
        matches!(self, UserAction::Back | UserAction::Forward | UserAction::Navigate(_))
    }
}

/// A tracking side effect owed for one dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    TabChange { tab: String },
    Pagination { page: u32 },
    Search { query: String },
    ResultClick {
        id: String,
        platform: String,
        title: String,
    },
    ImageClick { id: String, title: String },
}

/// What a dispatch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatched {
    pub state_changed: bool,
    pub history_pushed: bool,
    /// The restored entry was rewritten to its canonical URL.
    pub history_replaced: bool,
    pub effects: Vec<Effect>,
}

/// Everything a renderer needs for the current view.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub state: &'a ViewState,
    pub query: &'a str,
    pub items: Vec<&'a SimResult>,
    pub filtered_count: usize,
    pub total_pages: u32,
    pub tokens: Vec<PageToken>,
    pub selected: Option<&'a SimResult>,
}

pub struct SimulationEngine {
    dataset: Dataset,
    page_size: usize,
    state: ViewState,
    history: HistorySync,
    tracker: TrackingClient,
}

impl SimulationEngine {
    /// Loads the page at `location_query`.
    ///
    /// The initial state comes from the URL, the history stack starts on that
    /// URL without a push, and a single `page_view` is emitted.
    pub fn mount(
        dataset: Dataset,
        location_query: &str,
        tracker: TrackingClient,
        config: &SimConfig,
    ) -> Self {
        let page_size = config.page_size.max(1);
        let initial = ViewState::new(dataset.default_query.clone());
        let state = {
            let ctx = NavContext::new(&dataset, page_size);
            Transition::RestoreFromUrl(UrlParams::parse(location_query)).apply(&initial, &ctx)
        };
        let history = HistorySync::mount(location_query);

        tracing::info!(
            persona = %dataset.persona,
            page = state.current_page,
            tab = %state.active_tab,
            "Simulation mounted"
        );
        tracker.track_page_view(Some(state.current_page), Some(state.active_tab.label()));

        Self {
            dataset,
            page_size,
            state,
            history,
            tracker,
        }
    }

    pub fn dispatch(&mut self, action: UserAction) -> Dispatched {
        tracing::debug!(?action, "Dispatching user action");

        let Some(transition) = self.transition_for(&action) else {
            let effects = side_effects(&action, &self.state, &self.state, &self.dataset);
            self.perform(&effects);
            return Dispatched {
                effects,
                ..Dispatched::default()
            };
        };

        let next = {
            let ctx = NavContext::new(&self.dataset, self.page_size);
            transition.apply(&self.state, &ctx)
        };
        let effects = side_effects(&action, &self.state, &next, &self.dataset);
        let state_changed = next != self.state;
        self.state = next;

        self.perform(&effects);
        let (history_pushed, history_replaced) = if action.restores_entry() {
            (false, self.history.canonicalize_current(&self.state))
        } else {
            (self.history.reconcile(&self.state), false)
        };

        Dispatched {
            state_changed,
            history_pushed,
            history_replaced,
            effects,
        }
    }

    fn transition_for(&mut self, action: &UserAction) -> Option<Transition> {
        let current = self.state.current_page;
        match action {
            UserAction::Search(query) => Some(Transition::SetQuery(query.clone())),
            UserAction::SelectTab(tab) => Some(Transition::SetTab(tab.clone())),
            UserAction::GoToPage(page) => Some(Transition::SetPage(*page)),
            UserAction::NextPage => Some(Transition::SetPage(current.saturating_add(1))),
            UserAction::PreviousPage => Some(Transition::SetPage(current.saturating_sub(1))),
            UserAction::OpenResult(id) => Some(Transition::SelectResult(id.clone())),
            UserAction::CloseResult => Some(Transition::ClearResult),
            UserAction::ClickImage { .. } => None,
            UserAction::Back => self
                .history
                .back()
                .map(|entry| HistorySync::restore_transition(&entry)),
            UserAction::Forward => self
                .history
                .forward()
                .map(|entry| HistorySync::restore_transition(&entry)),
            UserAction::Navigate(query) => {
                let entry = self.history.navigate_external(query);
                Some(HistorySync::restore_transition(&entry))
            }
        }
    }

    fn perform(&self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::TabChange { tab } => self.tracker.track_tab_change(tab),
                Effect::Pagination { page } => self.tracker.track_pagination(*page),
                Effect::Search { query } => self.tracker.track_search(query),
                Effect::ResultClick {
                    id,
                    platform,
                    title,
                } => self.tracker.track_result_click(id, platform, title),
                Effect::ImageClick { id, title } => self.tracker.track_image_click(id, title),
            }
        }
    }

    pub fn page(&self) -> PageView<'_> {
        let projection = projector::project(
            &self.dataset.results,
            &self.state.active_tab,
            self.state.current_page,
            self.page_size,
        );
        PageView {
            state: &self.state,
            query: self.history.current_query(),
            tokens: projector::page_tokens(self.state.current_page, projection.total_pages),
            items: projection.items,
            filtered_count: projection.filtered_count,
            total_pages: projection.total_pages,
            selected: self
                .state
                .selected_result_id
                .as_deref()
                .and_then(|id| self.dataset.find(id)),
        }
    }

    /// Tabs offered by the page: the pass-through set, then one per platform.
    pub fn tabs(&self) -> Vec<Tab> {
        let mut tabs = vec![
            Tab::All,
            Tab::Videos,
            Tab::Images,
            Tab::News,
            Tab::ShortVideos,
            Tab::Shopping,
        ];
        tabs.extend(
            self.dataset
                .platforms()
                .into_iter()
                .map(|platform| Tab::Platform(platform.to_string())),
        );
        tabs
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_query(&self) -> &str {
        self.history.current_query()
    }

    pub fn history(&self) -> &HistorySync {
        &self.history
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn tracker(&self) -> &TrackingClient {
        &self.tracker
    }
}

/// Side-effect rules, evaluated on the step from `prev` to `next`.
///
/// - tab changed: `tab_change`
/// - page changed to a page after the first: `pagination`
/// - `Search`: `search`
/// - `OpenResult` that selected a result: result click
/// - `ClickImage`: image click
pub fn side_effects(
    action: &UserAction,
    prev: &ViewState,
    next: &ViewState,
    dataset: &Dataset,
) -> Vec<Effect> {
    let mut effects = Vec::new();

    if next.active_tab != prev.active_tab {
        effects.push(Effect::TabChange {
            tab: next.active_tab.label().to_string(),
        });
    }
    if next.current_page != prev.current_page && next.current_page > 1 {
        effects.push(Effect::Pagination {
            page: next.current_page,
        });
    }

    match action {
        UserAction::Search(query) => effects.push(Effect::Search {
            query: query.clone(),
        }),
        UserAction::OpenResult(id) if next.selected_result_id.as_deref() == Some(id.as_str()) => {
            if let Some(result) = dataset.find(id) {
                effects.push(Effect::ResultClick {
                    id: result.id.clone(),
                    platform: result.platform.clone(),
                    title: result.title.clone(),
                });
            }
        }
        UserAction::ClickImage { id, title } => effects.push(Effect::ImageClick {
            id: id.clone(),
            title: title.clone(),
        }),
        _ => {}
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::dataset;
    use crate::state::canonical_query;
    use crate::tracking::{DeliveryMode, MemoryTransport, SessionStore};
    use proptest::prelude::*;
    use searchsim_tracking_protocol::EventType;
    use std::rc::Rc;
    use std::sync::Arc;

    fn mounted(data: Dataset, location: &str) -> (SimulationEngine, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new());
        let tracker = TrackingClient::new(
            data.persona.clone(),
            Rc::new(SessionStore::in_memory()),
            transport.clone(),
            DeliveryMode::Inline,
        );
        let engine = SimulationEngine::mount(data, location, tracker, &SimConfig::default());
        (engine, transport)
    }

    fn linkedin() -> Tab {
        Tab::Platform("LinkedIn".to_string())
    }

    #[test]
    fn mount_restores_url_and_emits_one_page_view() {
        let (engine, transport) = mounted(dataset(15, 5, 30), "?page=3&tab=All");
        assert_eq!(engine.state().current_page, 3);
        assert_eq!(engine.state().search_query, "Greg Krieger");
        assert_eq!(engine.history().stack().len(), 1);

        let events = transport.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::PageView);
        assert_eq!(events[0].page, Some(3));
        assert_eq!(events[0].tab.as_deref(), Some("All"));
    }

    #[test]
    fn selecting_linkedin_tab_emits_exactly_one_tab_change() {
        let (mut engine, transport) = mounted(dataset(15, 5, 30), "");
        transport.drain();

        let outcome = engine.dispatch(UserAction::SelectTab(linkedin()));

        assert_eq!(engine.state().active_tab, linkedin());
        assert_eq!(engine.state().current_page, 1);
        assert_eq!(engine.current_query(), "?tab=LinkedIn");
        assert!(outcome.history_pushed);

        let events = transport.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::TabChange);
        assert_eq!(events[0].tab.as_deref(), Some("LinkedIn"));
    }

    #[test]
    fn back_after_two_advances_restores_first_advance() {
        let (mut engine, _transport) = mounted(dataset(0, 0, 45), "");
        engine.dispatch(UserAction::OpenResult("web-3".to_string()));
        engine.dispatch(UserAction::NextPage);
        let after_first = engine.state().clone();
        engine.dispatch(UserAction::NextPage);
        assert_eq!(engine.state().current_page, 3);

        engine.dispatch(UserAction::Back);

        assert_eq!(engine.state(), &after_first);
        assert_eq!(engine.state().current_page, 2);
        assert_eq!(engine.state().selected_result_id.as_deref(), Some("web-3"));
        assert_eq!(engine.current_query(), "?page=2&result=web-3");
        assert_eq!(engine.page().selected.map(|r| r.id.as_str()), Some("web-3"));
    }

    #[test]
    fn forward_after_back_returns_to_later_entry() {
        let (mut engine, _transport) = mounted(dataset(0, 0, 45), "");
        engine.dispatch(UserAction::GoToPage(2));
        engine.dispatch(UserAction::GoToPage(4));
        engine.dispatch(UserAction::Back);
        let outcome = engine.dispatch(UserAction::Forward);

        assert_eq!(engine.state().current_page, 4);
        assert!(!outcome.history_pushed);
        assert_eq!(engine.history().stack().len(), 3);
    }

    #[test]
    fn back_at_start_of_history_is_a_no_op() {
        let (mut engine, transport) = mounted(dataset(0, 0, 5), "");
        transport.drain();
        let outcome = engine.dispatch(UserAction::Back);
        assert_eq!(outcome, Dispatched::default());
        assert!(transport.events().is_empty());
    }

    #[test]
    fn transport_failure_leaves_state_untouched() {
        let (mut engine, transport) = mounted(dataset(15, 5, 30), "");
        transport.set_failing(true);

        engine.dispatch(UserAction::SelectTab(linkedin()));
        engine.dispatch(UserAction::NextPage);

        assert_eq!(engine.state().active_tab, linkedin());
        assert_eq!(engine.state().current_page, 2);
        assert_eq!(engine.current_query(), "?page=2&tab=LinkedIn");
        assert!(transport.events().is_empty());
    }

    #[test]
    fn repeated_dispatch_does_not_duplicate_history() {
        let (mut engine, _transport) = mounted(dataset(0, 0, 30), "");
        engine.dispatch(UserAction::GoToPage(2));
        let outcome = engine.dispatch(UserAction::GoToPage(2));
        assert!(!outcome.state_changed);
        assert!(!outcome.history_pushed);
        assert_eq!(engine.history().stack().len(), 2);
    }

    #[test]
    fn returning_to_page_one_is_not_pagination() {
        let (mut engine, transport) = mounted(dataset(0, 0, 30), "?page=2");
        transport.drain();
        let outcome = engine.dispatch(UserAction::PreviousPage);
        assert_eq!(engine.state().current_page, 1);
        assert!(outcome.effects.is_empty());
        assert!(transport.events().is_empty());
    }

    #[test]
    fn open_result_tracks_click_with_platform() {
        let (mut engine, transport) = mounted(dataset(3, 2, 0), "");
        transport.drain();

        engine.dispatch(UserAction::OpenResult("fb-1".to_string()));
        engine.dispatch(UserAction::OpenResult("missing".to_string()));

        let events = transport.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].element_type, "result_card");
        assert_eq!(events[0].element_id.as_deref(), Some("fb-1"));
        assert_eq!(events[0].platform.as_deref(), Some("Facebook"));
        assert_eq!(engine.state().selected_result_id, None);
    }

    #[test]
    fn search_and_image_click_are_tracked_without_history() {
        let (mut engine, transport) = mounted(dataset(3, 0, 0), "");
        transport.drain();

        let search = engine.dispatch(UserAction::Search("Meredith".to_string()));
        let image = engine.dispatch(UserAction::ClickImage {
            id: "img-2".to_string(),
            title: "Headshot".to_string(),
        });

        assert!(!search.history_pushed);
        assert!(!image.state_changed);
        assert_eq!(engine.state().search_query, "Meredith");

        let kinds: Vec<EventType> = transport.drain().iter().map(|e| e.event_type).collect();
        assert_eq!(kinds, vec![EventType::Search, EventType::Click]);
    }

    #[test]
    fn navigate_to_edited_url_clamps_and_canonicalizes() {
        let (mut engine, _transport) = mounted(dataset(12, 0, 0), "");
        engine.dispatch(UserAction::Navigate("?page=99&tab=LinkedIn&result=ghost".to_string()));

        assert_eq!(engine.state().current_page, 2);
        assert_eq!(engine.state().selected_result_id, None);
        assert_eq!(engine.current_query(), "?page=2&tab=LinkedIn");
    }

    #[test]
    fn back_from_edited_url_reaches_initial_entry() {
        let (mut engine, _transport) = mounted(dataset(12, 0, 0), "");

        let navigated = engine.dispatch(UserAction::Navigate("?page=99".to_string()));
        assert!(navigated.history_replaced);
        assert!(!navigated.history_pushed);
        assert_eq!(engine.state().current_page, 2);
        assert_eq!(engine.current_query(), "?page=2");
        assert_eq!(engine.history().stack().len(), 2);

        engine.dispatch(UserAction::Back);
        assert_eq!(engine.state().current_page, 1);
        assert_eq!(engine.current_query(), "");
        assert_eq!(engine.history().stack().cursor(), 0);

        engine.dispatch(UserAction::Forward);
        assert_eq!(engine.state().current_page, 2);
    }

    #[test]
    fn back_to_non_canonical_initial_url_keeps_forward_history() {
        for location in ["?utm_source=mail", "?page=1&tab=All", "?page=0&tab=Myspace"] {
            let (mut engine, _transport) = mounted(dataset(12, 0, 0), location);
            engine.dispatch(UserAction::NextPage);
            assert_eq!(engine.current_query(), "?page=2");

            let back = engine.dispatch(UserAction::Back);
            assert!(back.history_replaced, "{}", location);
            assert!(!back.history_pushed, "{}", location);
            assert_eq!(engine.state().current_page, 1);
            assert_eq!(engine.current_query(), "");
            assert_eq!(engine.history().stack().len(), 2);

            let forward = engine.dispatch(UserAction::Forward);
            assert!(!forward.history_pushed);
            assert_eq!(engine.state().current_page, 2, "{}", location);
            assert_eq!(engine.current_query(), "?page=2");

            assert_eq!(engine.dispatch(UserAction::Forward), Dispatched::default());
        }
    }

    #[test]
    fn page_view_projects_current_tab() {
        let (mut engine, _transport) = mounted(dataset(15, 5, 130), "");
        engine.dispatch(UserAction::GoToPage(10));

        let view = engine.page();
        assert_eq!(view.total_pages, 15);
        assert_eq!(view.filtered_count, 150);
        assert_eq!(view.items.len(), 10);
        assert_eq!(
            view.tokens,
            vec![
                PageToken::Page(1),
                PageToken::Ellipsis,
                PageToken::Page(9),
                PageToken::Page(10),
                PageToken::Page(11),
                PageToken::Ellipsis,
                PageToken::Page(15),
            ]
        );
        assert_eq!(view.query, "?page=10");
    }

    #[test]
    fn tabs_list_pass_through_then_platforms() {
        let (engine, _transport) = mounted(dataset(1, 1, 1), "");
        let labels: Vec<String> = engine.tabs().iter().map(|t| t.label().to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "All",
                "Videos",
                "Images",
                "News",
                "Short videos",
                "Shopping",
                "LinkedIn",
                "Facebook",
                "Web"
            ]
        );
    }

    fn action() -> impl Strategy<Value = UserAction> {
        prop_oneof![
            "[a-z ]{0,8}".prop_map(UserAction::Search),
            prop::sample::select(vec!["All", "Images", "News", "LinkedIn", "Facebook", "Myspace"])
                .prop_map(|label| UserAction::SelectTab(Tab::from_label(label))),
            (0u32..9).prop_map(UserAction::GoToPage),
            Just(UserAction::NextPage),
            Just(UserAction::PreviousPage),
            prop::sample::select(vec!["li-0", "li-11", "fb-2", "web-7", "ghost"])
                .prop_map(|id| UserAction::OpenResult(id.to_string())),
            Just(UserAction::CloseResult),
            Just(UserAction::ClickImage {
                id: "img-1".to_string(),
                title: "Headshot".to_string(),
            }),
            Just(UserAction::Back),
            Just(UserAction::Forward),
            prop::sample::select(vec![
                "",
                "?page=99",
                "?tab=Myspace&page=2",
                "?page=2&tab=LinkedIn&result=li-11",
                "?utm_source=mail&tab=Facebook",
            ])
            .prop_map(|query| UserAction::Navigate(query.to_string())),
        ]
    }

    proptest! {
        #[test]
        fn navigation_invariants_hold_for_any_action_sequence(
            actions in prop::collection::vec(action(), 1..40)
        ) {
            let (mut engine, _transport) = mounted(dataset(15, 3, 22), "");

            for action in actions {
                let selects_tab = matches!(action, UserAction::SelectTab(_));
                let stack_len = engine.history().stack().len();
                let restores = action.restores_entry();

                let outcome = engine.dispatch(action);
                let state = engine.state().clone();
                let total_pages = engine.page().total_pages;

                if selects_tab {
                    prop_assert_eq!(state.current_page, 1);
                }
                prop_assert!(state.current_page >= 1);
                prop_assert!(state.current_page <= total_pages.max(1));

                prop_assert_eq!(engine.current_query(), canonical_query(&state));
                let params = UrlParams::parse(engine.current_query());
                prop_assert_eq!(params.page, state.current_page);
                prop_assert_eq!(&params.tab, &state.active_tab);
                prop_assert_eq!(&params.result, &state.selected_result_id);

                if restores {
                    prop_assert!(!outcome.history_pushed);
                }
                if !restores && !outcome.history_pushed {
                    prop_assert_eq!(engine.history().stack().len(), stack_len);
                }
            }
        }
    }
}
