//! Plain-text rendering of controller snapshots.

use client_core::{paginate, FetchMode, Snapshot};
use shared::{domain::Character, protocol::StatusFilter};

pub const EMPTY_NOTICE: &str = "No characters found.";
pub const LOADING_NOTICE: &str = "Loading characters...";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub mode: FetchMode,
    /// Local page size, used only for eagerly fetched collections.
    pub page_size: usize,
}

/// Where the listing currently is, for the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub page: u32,
    /// `None` until a page has loaded and the server reported a total.
    pub pages: Option<u32>,
}

pub fn position(snapshot: &Snapshot, options: &RenderOptions) -> Position {
    match options.mode {
        FetchMode::Eager => {
            let local = paginate(&snapshot.entities, snapshot.current_page, options.page_size);
            Position {
                page: local.page,
                pages: Some(local.pages),
            }
        }
        FetchMode::SinglePage => Position {
            page: snapshot.current_page,
            pages: snapshot.page_info.as_ref().map(|info| info.pages),
        },
    }
}

pub fn render(snapshot: &Snapshot, options: &RenderOptions) -> String {
    let mut lines = vec![
        "Rick and Morty Characters".to_string(),
        format!(
            "Sort By: {}   Filter by Status: {}",
            snapshot.sort.label(),
            filter_label(snapshot.status_filter)
        ),
        String::new(),
    ];

    if let Some(error) = &snapshot.error {
        lines.push(format!("[error] {error}"));
        lines.push(String::new());
    }

    if snapshot.loading {
        lines.push(LOADING_NOTICE.to_string());
        return finish(lines);
    }

    if snapshot.shows_empty_notice() {
        lines.push(EMPTY_NOTICE.to_string());
        return finish(lines);
    }

    let (cards, footer) = match options.mode {
        FetchMode::Eager => {
            let local = paginate(&snapshot.entities, snapshot.current_page, options.page_size);
            let footer = pagination_line(local.page, Some(local.pages), local.count as u64);
            (local.items, with_moves(footer, local.has_prev(), local.has_next()))
        }
        FetchMode::SinglePage => {
            let footer = match &snapshot.page_info {
                Some(info) => with_moves(
                    pagination_line(snapshot.current_page, Some(info.pages), info.count),
                    !info.is_first(),
                    !info.is_last(),
                ),
                None => pagination_line(
                    snapshot.current_page,
                    None,
                    snapshot.entities.len() as u64,
                ),
            };
            (snapshot.entities.as_slice(), footer)
        }
    };

    for character in cards {
        lines.extend(card(character));
        lines.push(String::new());
    }
    lines.push(footer);
    finish(lines)
}

fn card(character: &Character) -> Vec<String> {
    let mut lines = vec![
        character.name.clone(),
        format!("  Species: {}", character.species),
        format!("  Status:  {}", character.status.label()),
        format!("  Gender:  {}", character.gender),
        format!("  Created: {}", character.created_display()),
    ];
    if let Some(image) = character.image_url() {
        lines.push(format!("  Image:   {image}"));
    }
    lines
}

fn pagination_line(page: u32, pages: Option<u32>, count: u64) -> String {
    let noun = if count == 1 { "character" } else { "characters" };
    let pages = pages.map_or_else(|| "?".to_string(), |pages| pages.to_string());
    format!("Page {page} of {pages} · {count} {noun}")
}

fn with_moves(line: String, prev: bool, next: bool) -> String {
    match (prev, next) {
        (true, true) => format!("{line}   (prev | next)"),
        (true, false) => format!("{line}   (prev)"),
        (false, true) => format!("{line}   (next)"),
        (false, false) => line,
    }
}

fn filter_label(filter: StatusFilter) -> &'static str {
    match filter {
        StatusFilter::All => "All",
        StatusFilter::Alive => "Alive",
        StatusFilter::Dead => "Dead",
        StatusFilter::Unknown => "Unknown",
    }
}

fn finish(mut lines: Vec<String>) -> String {
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use client_core::{FetchMode, ListController, ListParams, Phase, LOAD_FAILED_MESSAGE};
    use shared::{
        domain::{CharacterId, CharacterStatus},
        protocol::{CharacterPage, PageInfo, SortOption},
    };

    use super::*;

    fn character(id: i64, name: &str) -> Character {
        Character {
            id: CharacterId(id),
            name: name.to_string(),
            species: "Human".to_string(),
            status: CharacterStatus::Alive,
            gender: "Male".to_string(),
            created: "2017-11-04T18:48:46.250Z".parse().expect("timestamp"),
            image: format!("https://rickandmortyapi.com/api/character/avatar/{id}.jpeg"),
        }
    }

    fn snapshot(entities: Vec<Character>, page_info: Option<PageInfo>) -> Snapshot {
        Snapshot {
            entities,
            page_info,
            loading: false,
            error: None,
            phase: Phase::Ready,
            sort: SortOption::NameAsc,
            status_filter: StatusFilter::All,
            current_page: 1,
        }
    }

    const EAGER: RenderOptions = RenderOptions {
        mode: FetchMode::Eager,
        page_size: 2,
    };
    const PAGED: RenderOptions = RenderOptions {
        mode: FetchMode::SinglePage,
        page_size: 20,
    };

    #[test]
    fn renders_one_card_per_character_with_details() {
        let out = render(&snapshot(vec![character(1, "Rick Sanchez")], None), &PAGED);

        assert!(out.contains("Rick Sanchez\n  Species: Human\n  Status:  Alive"));
        assert!(out.contains("  Gender:  Male"));
        assert!(out.contains("  Created: 11/4/2017"));
        assert!(out.contains("  Image:   https://rickandmortyapi.com/api/character/avatar/1.jpeg"));
        assert!(out.contains("Page 1 of ? · 1 character\n"));
    }

    #[test]
    fn eager_mode_pages_locally() {
        let mut view = snapshot(
            vec![character(1, "Beth"), character(2, "Morty"), character(3, "Rick")],
            Some(PageInfo::single(3)),
        );
        view.current_page = 2;

        let out = render(&view, &EAGER);

        assert!(out.contains("Rick\n  Species"));
        assert!(!out.contains("Beth\n"));
        assert!(out.contains("Page 2 of 2 · 3 characters   (prev)\n"));
        assert_eq!(
            position(&view, &EAGER),
            Position {
                page: 2,
                pages: Some(2)
            }
        );
    }

    #[test]
    fn single_page_mode_uses_server_page_info() {
        let mut view = snapshot(
            vec![character(21, "Squanchy")],
            Some(PageInfo {
                count: 826,
                pages: 42,
                next: Some("https://rickandmortyapi.com/api/character?page=3".to_string()),
                prev: Some("https://rickandmortyapi.com/api/character?page=1".to_string()),
            }),
        );
        view.current_page = 2;

        let out = render(&view, &PAGED);

        assert!(out.contains("Page 2 of 42 · 826 characters   (prev | next)"));
        assert_eq!(
            position(&view, &PAGED),
            Position {
                page: 2,
                pages: Some(42)
            }
        );
    }

    #[test]
    fn loading_hides_cards() {
        let mut view = snapshot(vec![character(1, "Rick")], None);
        view.loading = true;
        view.phase = Phase::Loading;

        let out = render(&view, &PAGED);

        assert!(out.contains(LOADING_NOTICE));
        assert!(!out.contains("Species"));
        assert!(!out.contains(EMPTY_NOTICE));
    }

    #[test]
    fn failure_shows_banner_and_empty_notice() {
        let mut controller = ListController::with_params(FetchMode::SinglePage, ListParams::default());
        let request = controller.activate();
        controller.complete(
            request.seq,
            Err(client_core::NetworkError::Timeout(std::time::Duration::from_secs(1))),
        );

        let out = render(&controller.snapshot(), &PAGED);

        assert!(out.contains(&format!("[error] {LOAD_FAILED_MESSAGE}")));
        assert!(out.contains(EMPTY_NOTICE));
        assert_eq!(
            position(&controller.snapshot(), &PAGED),
            Position {
                page: 1,
                pages: None
            }
        );
    }

    #[test]
    fn empty_filter_result_shows_notice() {
        let mut controller = ListController::new(FetchMode::Eager);
        let request = controller.activate();
        controller.complete(
            request.seq,
            Ok(CharacterPage {
                info: PageInfo::single(1),
                results: vec![character(1, "Rick")],
            }),
        );
        controller.set_status_filter(StatusFilter::Dead);

        let out = render(&controller.snapshot(), &EAGER);

        assert!(out.contains("Filter by Status: Dead"));
        assert!(out.contains(EMPTY_NOTICE));
        assert!(!out.contains("[error]"));
    }
}
