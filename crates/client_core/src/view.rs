//! Pure derivation of the visible list from fetched characters.

use std::cmp::Ordering;

use shared::{
    domain::Character,
    protocol::{SortOption, StatusFilter},
};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Filters by status (unless `All`) and stably sorts a copy of `characters`.
pub fn derive_view(
    characters: &[Character],
    sort: SortOption,
    filter: StatusFilter,
) -> Vec<Character> {
    let mut view: Vec<Character> = characters
        .iter()
        .filter(|character| filter.matches(character.status))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep their fetched order.
    match sort {
        SortOption::NameAsc => view.sort_by(|a, b| collate(&a.name, &b.name)),
        SortOption::NameDesc => view.sort_by(|a, b| collate(&b.name, &a.name)),
        SortOption::DateAsc => view.sort_by(|a, b| a.created.cmp(&b.created)),
        SortOption::DateDesc => view.sort_by(|a, b| b.created.cmp(&a.created)),
    }

    view
}

/// Dictionary-style name ordering, compared level by level:
/// base letters without case or accents, then accents (unaccented first),
/// then case (lowercase first).
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase_nfd(a).cmp(lowercase_nfd(b)))
        .then_with(|| case_order(a, b))
}

fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase_nfd(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd().flat_map(char::to_lowercase)
}

fn case_order(a: &str, b: &str) -> Ordering {
    a.nfd()
        .zip(b.nfd())
        .find(|(x, y)| x != y)
        .map_or(Ordering::Equal, |(x, y)| {
            match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            }
        })
}

/// One locally computed page of an already ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalPage<'a> {
    pub items: &'a [Character],
    pub page: u32,
    pub pages: u32,
    pub count: usize,
}

impl LocalPage<'_> {
    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Slices `ordered` into pages of `page_size`. `page` is clamped into
/// `1..=pages`; an empty list yields page 1 of 0.
pub fn paginate(ordered: &[Character], page: u32, page_size: usize) -> LocalPage<'_> {
    let page_size = page_size.max(1);
    let count = ordered.len();
    let pages = u32::try_from(count.div_ceil(page_size)).unwrap_or(u32::MAX);
    let page = page.clamp(1, pages.max(1));

    let start = (page as usize - 1).saturating_mul(page_size).min(count);
    let end = start.saturating_add(page_size).min(count);

    LocalPage {
        items: &ordered[start..end],
        page,
        pages,
        count,
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
