// Search, filter and sort over the contest listing.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ContestCard
// ---------------------------------------------------------------------------

/// One contest as listed on the browse screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestCard {
    pub contest_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub entry_count: u32,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_my_contest: bool,
    #[serde(default)]
    pub has_entered: bool,
    #[serde(default)]
    pub has_results: bool,
}

impl ContestCard {
    pub fn is_open(&self) -> bool {
        !self.is_locked
    }

    fn searchable_text(&self) -> String {
        format!("{} {} {}", self.name, self.description, self.creator).to_lowercase()
    }
}

/// Load the contest listing from a JSON array.
pub fn load_contests(path: &Path) -> anyhow::Result<Vec<ContestCard>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read contests {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse contests {}", path.display()))
}

// ---------------------------------------------------------------------------
// Filters and sort orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContestFilter {
    Open,
    Locked,
    MyContests,
    Entered,
    NotEntered,
    HasResults,
}

impl ContestFilter {
    pub const ALL: [ContestFilter; 6] = [
        ContestFilter::Open,
        ContestFilter::Locked,
        ContestFilter::MyContests,
        ContestFilter::Entered,
        ContestFilter::NotEntered,
        ContestFilter::HasResults,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContestFilter::Open => "Open for Entry",
            ContestFilter::Locked => "Locked",
            ContestFilter::MyContests => "My Contests",
            ContestFilter::Entered => "I've Entered",
            ContestFilter::NotEntered => "Not Entered",
            ContestFilter::HasResults => "Has Results",
        }
    }

    pub fn matches(self, card: &ContestCard) -> bool {
        match self {
            ContestFilter::Open => card.is_open(),
            ContestFilter::Locked => card.is_locked,
            ContestFilter::MyContests => card.is_my_contest,
            ContestFilter::Entered => card.has_entered,
            ContestFilter::NotEntered => !card.has_entered,
            ContestFilter::HasResults => card.has_results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
    Deadline,
    Entries,
}

impl SortBy {
    pub fn label(self) -> &'static str {
        match self {
            SortBy::Newest => "Newest First",
            SortBy::Oldest => "Oldest First",
            SortBy::NameAsc => "Name A-Z",
            SortBy::NameDesc => "Name Z-A",
            SortBy::Deadline => "By Deadline",
            SortBy::Entries => "Most Entries",
        }
    }

    /// Next order in the selector, wrapping around.
    pub fn next(self) -> Self {
        match self {
            SortBy::Newest => SortBy::Oldest,
            SortBy::Oldest => SortBy::NameAsc,
            SortBy::NameAsc => SortBy::NameDesc,
            SortBy::NameDesc => SortBy::Deadline,
            SortBy::Deadline => SortBy::Entries,
            SortBy::Entries => SortBy::Newest,
        }
    }

    fn compare(self, a: &ContestCard, b: &ContestCard) -> Ordering {
        let created = |c: &ContestCard| c.created_at.map_or(0, |t| t.timestamp_millis());
        match self {
            SortBy::Newest => created(b).cmp(&created(a)),
            SortBy::Oldest => created(a).cmp(&created(b)),
            SortBy::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortBy::NameDesc => b.name.to_lowercase().cmp(&a.name.to_lowercase()),
            SortBy::Deadline => match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortBy::Entries => b.entry_count.cmp(&a.entry_count),
        }
    }
}

// ---------------------------------------------------------------------------
// ContestSearch
// ---------------------------------------------------------------------------

/// Search term, active filters and sort order applied to a contest list.
///
/// Holds indices into the card slice passed to `refresh`, in display order.
#[derive(Debug, Clone, Default)]
pub struct ContestSearch {
    term: String,
    filters: BTreeSet<ContestFilter>,
    sort_by: SortBy,
    total: usize,
    visible: Vec<usize>,
}

impl ContestSearch {
    pub fn new(cards: &[ContestCard]) -> Self {
        let mut search = ContestSearch::default();
        search.refresh(cards);
        search
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn active_filters(&self) -> impl Iterator<Item = ContestFilter> + '_ {
        self.filters.iter().copied()
    }

    pub fn is_active(&self, filter: ContestFilter) -> bool {
        self.filters.contains(&filter)
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.term = term.trim().to_lowercase();
    }

    /// Flip `filter` on or off. Returns whether it is now active.
    pub fn toggle_filter(&mut self, filter: ContestFilter) -> bool {
        if self.filters.remove(&filter) {
            false
        } else {
            self.filters.insert(filter);
            true
        }
    }

    pub fn remove_filter(&mut self, filter: ContestFilter) {
        self.filters.remove(&filter);
    }

    pub fn set_sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
    }

    /// Back to the unfiltered view: no term, no filters, default sort.
    pub fn clear_all(&mut self) {
        self.term.clear();
        self.filters.clear();
        self.sort_by = SortBy::default();
    }

    /// Recompute the visible cards.
    pub fn refresh(&mut self, cards: &[ContestCard]) {
        let mut visible: Vec<usize> = cards
            .iter()
            .enumerate()
            .filter(|(_, card)| self.term.is_empty() || card.searchable_text().contains(&self.term))
            .filter(|(_, card)| self.filters.iter().all(|f| f.matches(card)))
            .map(|(i, _)| i)
            .collect();
        // Stable, so equal keys keep listing order.
        visible.sort_by(|&a, &b| self.sort_by.compare(&cards[a], &cards[b]));

        self.total = cards.len();
        self.visible = visible;
    }

    /// Indices of matching cards in display order.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn is_empty_result(&self) -> bool {
        self.visible.is_empty()
    }

    /// "Showing X of Y contests", only while something narrows the list.
    pub fn stats(&self) -> Option<String> {
        let narrowed = self.visible.len() != self.total || !self.term.is_empty() || !self.filters.is_empty();
        narrowed.then(|| format!("Showing {} of {} contests", self.visible.len(), self.total))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2026, 10, d, 12, 0, 0).unwrap())
    }

    fn card(id: &str, name: &str) -> ContestCard {
        ContestCard {
            contest_id: id.into(),
            name: name.into(),
            description: String::new(),
            creator: String::new(),
            is_locked: false,
            entry_count: 0,
            deadline: None,
            created_at: None,
            is_my_contest: false,
            has_entered: false,
            has_results: false,
        }
    }

    fn cards() -> Vec<ContestCard> {
        let mut a = card("1", "NFL Week 7 Totals");
        a.creator = "alice".into();
        a.created_at = day(1);
        a.deadline = day(20);
        a.entry_count = 12;
        a.has_entered = true;

        let mut b = card("2", "nba opening night");
        b.description = "Player props".into();
        b.created_at = day(5);
        b.is_locked = true;
        b.has_results = true;
        b.entry_count = 30;

        let mut c = card("3", "College Football Saturday");
        c.created_at = day(3);
        c.deadline = day(18);
        c.is_my_contest = true;
        c.entry_count = 4;

        vec![a, b, c]
    }

    #[test]
    fn default_is_newest_first_without_stats() {
        let cards = cards();
        let search = ContestSearch::new(&cards);
        assert_eq!(search.visible(), &[1, 2, 0]);
        assert!(search.stats().is_none());
    }

    #[test]
    fn search_matches_name_description_and_creator() {
        let cards = cards();
        let mut search = ContestSearch::new(&cards);

        search.set_search_term("  PROPS ");
        search.refresh(&cards);
        assert_eq!(search.visible(), &[1]);

        search.set_search_term("alice");
        search.refresh(&cards);
        assert_eq!(search.visible(), &[0]);
        assert_eq!(search.stats().as_deref(), Some("Showing 1 of 3 contests"));
    }

    #[test]
    fn filters_combine_with_and() {
        let cards = cards();
        let mut search = ContestSearch::new(&cards);

        assert!(search.toggle_filter(ContestFilter::Open));
        search.refresh(&cards);
        assert_eq!(search.visible(), &[2, 0]);

        search.toggle_filter(ContestFilter::NotEntered);
        search.refresh(&cards);
        assert_eq!(search.visible(), &[2]);

        assert!(!search.toggle_filter(ContestFilter::Open));
        search.remove_filter(ContestFilter::NotEntered);
        search.refresh(&cards);
        assert_eq!(search.visible().len(), 3);
    }

    #[test]
    fn sort_orders() {
        let cards = cards();
        let mut search = ContestSearch::new(&cards);
        let mut order = |sort| {
            search.set_sort(sort);
            search.refresh(&cards);
            search.visible().to_vec()
        };
        assert_eq!(order(SortBy::Oldest), vec![0, 2, 1]);
        assert_eq!(order(SortBy::NameAsc), vec![2, 1, 0]);
        assert_eq!(order(SortBy::NameDesc), vec![0, 1, 2]);
        assert_eq!(order(SortBy::Deadline), vec![2, 0, 1]);
        assert_eq!(order(SortBy::Entries), vec![1, 0, 2]);
    }

    #[test]
    fn empty_result_and_clear_all() {
        let cards = cards();
        let mut search = ContestSearch::new(&cards);
        search.set_search_term("hockey");
        search.toggle_filter(ContestFilter::HasResults);
        search.set_sort(SortBy::Entries);
        search.refresh(&cards);
        assert!(search.is_empty_result());
        assert_eq!(search.stats().as_deref(), Some("Showing 0 of 3 contests"));

        search.clear_all();
        search.refresh(&cards);
        assert_eq!(search.visible().len(), 3);
        assert_eq!(search.sort_by(), SortBy::Newest);
        assert!(search.stats().is_none());
    }

    #[test]
    fn sort_cycle_wraps() {
        let mut sort = SortBy::default();
        for _ in 0..6 {
            sort = sort.next();
        }
        assert_eq!(sort, SortBy::Newest);
    }

    #[test]
    fn filter_labels() {
        let labels: Vec<_> = ContestFilter::ALL.iter().map(|f| f.label()).collect();
        assert_eq!(
            labels,
            ["Open for Entry", "Locked", "My Contests", "I've Entered", "Not Entered", "Has Results"]
        );
    }

    #[test]
    fn cards_parse_with_defaults() {
        let json = r#"[{"contest_id": "8", "name": "Totals", "deadline": "2026-10-20T18:00:00Z"}]"#;
        let cards: Vec<ContestCard> = serde_json::from_str(json).unwrap();
        assert!(cards[0].is_open());
        assert_eq!(cards[0].entry_count, 0);
        assert!(cards[0].deadline.is_some());
        assert!(cards[0].created_at.is_none());
    }
}
