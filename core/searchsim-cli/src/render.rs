//! Plain-text rendering of the simulated results page.

use searchsim_core::{PageToken, SimulationEngine};
use std::fmt::Write;

pub fn render(engine: &SimulationEngine) -> String {
    let view = engine.page();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Search: {}    [{}]",
        view.state.search_query,
        display_query(view.query)
    );

    let tabs: Vec<String> = engine
        .tabs()
        .iter()
        .map(|tab| {
            if *tab == view.state.active_tab {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join("  "));
    let _ = writeln!(
        out,
        "About {} results (page {} of {})",
        view.filtered_count,
        view.state.current_page,
        view.total_pages.max(1)
    );
    out.push('\n');

    if view.items.is_empty() {
        let _ = writeln!(out, "  No results.");
    }
    for item in &view.items {
        let marker = if view.selected.map(|s| s.id.as_str()) == Some(item.id.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(out, "{} {:<10} {}  ({})", marker, item.id, item.title, item.platform);
        if !item.url.is_empty() {
            let _ = writeln!(out, "             {}", item.url);
        }
        if !item.snippet.is_empty() {
            let _ = writeln!(out, "             {}", item.snippet);
        }
    }

    if view.total_pages > 1 {
        let _ = writeln!(
            out,
            "\nPages: {}",
            pagination_line(&view.tokens, view.state.current_page)
        );
    }

    if let Some(selected) = view.selected {
        let _ = writeln!(out, "\nOpen: {} - {}", selected.title, selected.url);
    }

    out
}

pub fn pagination_line(tokens: &[PageToken], current: u32) -> String {
    tokens
        .iter()
        .map(|token| match token {
            PageToken::Page(page) if *page == current => format!("[{}]", page),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_query(query: &str) -> &str {
    if query.is_empty() {
        "/"
    } else {
        query
    }
}
