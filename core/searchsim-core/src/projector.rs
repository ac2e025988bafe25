//! Results projection: filter, paginate, and window the page controls.
//!
//! Pure functions over the dataset. Nothing here mutates or caches, so the
//! engine calls them on every read of the view.

use std::fmt;

use crate::dataset::SimResult;
use crate::state::Tab;

pub const RESULTS_PER_PAGE: usize = 10;
pub const MAX_VISIBLE_PAGES: u32 = 10;

/// One page of filtered results plus the page-count metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<'a> {
    pub items: Vec<&'a SimResult>,
    pub filtered_count: usize,
    pub total_pages: u32,
}

/// Applies the tab filter.
///
/// Pass-through tabs (`All`, `Videos`, `Images`, `News`, `Short videos`,
/// `Shopping`) draw from the unfiltered set; a platform tab keeps only items
/// whose platform matches exactly.
pub fn filter<'a>(results: &'a [SimResult], tab: &Tab) -> Vec<&'a SimResult> {
    match tab.platform() {
        Some(platform) => results
            .iter()
            .filter(|result| result.platform == platform)
            .collect(),
        None => results.iter().collect(),
    }
}

pub fn filtered_count(results: &[SimResult], tab: &Tab) -> usize {
    match tab.platform() {
        Some(platform) => results
            .iter()
            .filter(|result| result.platform == platform)
            .count(),
        None => results.len(),
    }
}

/// `ceil(filtered_count / page_size)`; zero when nothing matches.
pub fn total_pages(filtered_count: usize, page_size: usize) -> u32 {
    let page_size = page_size.max(1);
    let pages = filtered_count.div_ceil(page_size);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn project<'a>(
    results: &'a [SimResult],
    tab: &Tab,
    page: u32,
    page_size: usize,
) -> Projection<'a> {
    let page_size = page_size.max(1);
    let filtered = filter(results, tab);
    let filtered_count = filtered.len();
    let start = (page.max(1) as usize - 1).saturating_mul(page_size);
    let items = filtered.into_iter().skip(start).take(page_size).collect();

    Projection {
        items,
        filtered_count,
        total_pages: total_pages(filtered_count, page_size),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Page(page) => write!(f, "{}", page),
            PageToken::Ellipsis => f.write_str("…"),
        }
    }
}

/// Page numbers to show in the pagination control.
///
/// ```text
/// total <= 10            1 2 ... total
/// current <= 4           1 2 3 4 5 … total
/// current >= total - 3   1 … total-4 .. total
/// otherwise              1 … current-1 current current+1 … total
/// ```
pub fn page_tokens(current: u32, total: u32) -> Vec<PageToken> {
    use PageToken::{Ellipsis, Page};

    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(Page).collect();
    }

    let mut tokens = vec![Page(1)];
    if current <= 4 {
        tokens.extend((2..=5).map(Page));
        tokens.push(Ellipsis);
        tokens.push(Page(total));
    } else if current >= total - 3 {
        tokens.push(Ellipsis);
        tokens.extend((total - 4..=total).map(Page));
    } else {
        tokens.push(Ellipsis);
        tokens.extend([Page(current - 1), Page(current), Page(current + 1)]);
        tokens.push(Ellipsis);
        tokens.push(Page(total));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::dataset;

    fn render(tokens: &[PageToken]) -> String {
        tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn small_page_counts_list_every_page() {
        for current in 1..=3 {
            assert_eq!(render(&page_tokens(current, 3)), "1,2,3");
        }
        assert_eq!(render(&page_tokens(7, 10)), "1,2,3,4,5,6,7,8,9,10");
        assert!(page_tokens(1, 0).is_empty());
    }

    #[test]
    fn leading_window() {
        assert_eq!(render(&page_tokens(1, 20)), "1,2,3,4,5,…,20");
        assert_eq!(render(&page_tokens(4, 20)), "1,2,3,4,5,…,20");
    }

    #[test]
    fn trailing_window() {
        assert_eq!(render(&page_tokens(18, 20)), "1,…,16,17,18,19,20");
        assert_eq!(render(&page_tokens(17, 20)), "1,…,16,17,18,19,20");
        assert_eq!(render(&page_tokens(20, 20)), "1,…,16,17,18,19,20");
    }

    #[test]
    fn middle_window() {
        assert_eq!(render(&page_tokens(10, 20)), "1,…,9,10,11,…,20");
        assert_eq!(render(&page_tokens(5, 20)), "1,…,4,5,6,…,20");
        assert_eq!(render(&page_tokens(16, 20)), "1,…,15,16,17,…,20");
    }

    #[test]
    fn first_window_boundary_at_eleven_pages() {
        assert_eq!(render(&page_tokens(5, 11)), "1,…,4,5,6,…,11");
        assert_eq!(render(&page_tokens(8, 11)), "1,…,7,8,9,10,11");
    }

    #[test]
    fn pass_through_tabs_use_full_set() {
        let data = dataset(3, 2, 4);
        for tab in [
            Tab::All,
            Tab::Videos,
            Tab::Images,
            Tab::News,
            Tab::ShortVideos,
            Tab::Shopping,
        ] {
            assert_eq!(filter(&data.results, &tab).len(), 9, "{}", tab.label());
        }
    }

    #[test]
    fn platform_tab_matches_exactly() {
        let data = dataset(3, 2, 4);
        let linkedin = filter(&data.results, &Tab::Platform("LinkedIn".to_string()));
        assert_eq!(linkedin.len(), 3);
        assert!(linkedin.iter().all(|r| r.platform == "LinkedIn"));

        let lower = filter(&data.results, &Tab::Platform("linkedin".to_string()));
        assert!(lower.is_empty());
    }

    #[test]
    fn project_slices_requested_page() {
        let data = dataset(0, 0, 25);
        let page = project(&data.results, &Tab::All, 3, 10);
        assert_eq!(page.filtered_count, 25);
        assert_eq!(page.total_pages, 3);
        let ids: Vec<_> = page.items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["web-20", "web-21", "web-22", "web-23", "web-24"]);
    }

    #[test]
    fn project_past_end_is_empty() {
        let data = dataset(0, 0, 5);
        let page = project(&data.results, &Tab::All, 4, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }
}
