use client_core::ControllerCommand;
use shared::protocol::{SortOption, StatusFilter};

use crate::render::Position;

pub const HELP: &str = "\
Commands:
  sort <name-asc|name-desc|date-asc|date-desc>
  status <all|alive|dead|unknown>
  page <n>      jump to page n
  next | prev   move one page
  reload        fetch again with the current settings (retries a failed load)
  help          show this text
  quit          leave the browser";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplAction {
    Dispatch(ControllerCommand),
    Help,
    Quit,
}

/// Parses one line of user input. Blank lines yield `Ok(None)`; errors are
/// messages meant for the user.
pub fn parse_line(line: &str, position: Position) -> Result<Option<ReplAction>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments for '{verb}'"));
    }

    let action = match (verb.to_ascii_lowercase().as_str(), argument) {
        ("sort", Some(raw)) => {
            let sort: SortOption = raw.parse().map_err(|err| format!("{err}"))?;
            ReplAction::Dispatch(ControllerCommand::SetSortOption(sort))
        }
        ("status" | "filter", Some(raw)) => {
            let filter: StatusFilter = raw.parse().map_err(|err| format!("{err}"))?;
            ReplAction::Dispatch(ControllerCommand::SetStatusFilter(filter))
        }
        ("page", Some(raw)) => {
            let page: u32 = raw
                .parse()
                .map_err(|_| format!("'{raw}' is not a page number"))?;
            ReplAction::Dispatch(ControllerCommand::SetPage(checked_page(page, position)?))
        }
        ("next" | "n", None) => {
            let page = position.page.saturating_add(1);
            ReplAction::Dispatch(ControllerCommand::SetPage(checked_page(page, position)?))
        }
        ("prev" | "p", None) => {
            if position.page <= 1 {
                return Err("already on the first page".to_string());
            }
            ReplAction::Dispatch(ControllerCommand::SetPage(position.page - 1))
        }
        ("reload" | "r", None) => ReplAction::Dispatch(ControllerCommand::Reload),
        ("help" | "?", None) => ReplAction::Help,
        ("quit" | "q" | "exit", None) => ReplAction::Quit,
        ("sort" | "status" | "filter" | "page", None) => {
            return Err(format!("'{verb}' needs an argument; type 'help'"));
        }
        (_, Some(_)) if is_known(verb) => {
            return Err(format!("'{verb}' takes no argument"));
        }
        _ => return Err(format!("unknown command '{verb}'; type 'help'")),
    };
    Ok(Some(action))
}

/// Without a known page count any page may be requested; the server decides.
fn checked_page(page: u32, position: Position) -> Result<u32, String> {
    if page == 0 {
        return Err("pages start at 1".to_string());
    }
    if let Some(last) = position.pages.map(|pages| pages.max(1)) {
        if page > last {
            return Err(format!("page {page} is past the last page ({last})"));
        }
    }
    Ok(page)
}

fn is_known(verb: &str) -> bool {
    matches!(
        verb.to_ascii_lowercase().as_str(),
        "next" | "n" | "prev" | "p" | "reload" | "r" | "help" | "?" | "quit" | "q" | "exit"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIDDLE: Position = Position {
        page: 2,
        pages: Some(3),
    };

    fn dispatched(line: &str, position: Position) -> ControllerCommand {
        match parse_line(line, position) {
            Ok(Some(ReplAction::Dispatch(command))) => command,
            other => panic!("'{line}' did not dispatch: {other:?}"),
        }
    }

    #[test]
    fn parses_parameter_commands() {
        assert_eq!(
            dispatched("sort date-desc", MIDDLE),
            ControllerCommand::SetSortOption(SortOption::DateDesc)
        );
        assert_eq!(
            dispatched("  STATUS Dead ", MIDDLE),
            ControllerCommand::SetStatusFilter(StatusFilter::Dead)
        );
        assert_eq!(
            dispatched("status all", MIDDLE),
            ControllerCommand::SetStatusFilter(StatusFilter::All)
        );
        assert_eq!(dispatched("page 3", MIDDLE), ControllerCommand::SetPage(3));
        assert_eq!(dispatched("reload", MIDDLE), ControllerCommand::Reload);
    }

    #[test]
    fn next_and_prev_move_within_bounds() {
        assert_eq!(dispatched("next", MIDDLE), ControllerCommand::SetPage(3));
        assert_eq!(dispatched("prev", MIDDLE), ControllerCommand::SetPage(1));

        let first = Position {
            page: 1,
            pages: Some(3),
        };
        assert!(parse_line("prev", first).is_err());
        let last = Position {
            page: 3,
            pages: Some(3),
        };
        assert!(parse_line("next", last).is_err());
    }

    #[test]
    fn rejects_out_of_range_pages() {
        assert!(parse_line("page 0", MIDDLE).is_err());
        assert!(parse_line("page 4", MIDDLE).is_err());
        assert!(parse_line("page two", MIDDLE).is_err());
        // An empty local collection still has a first page.
        let empty = Position {
            page: 1,
            pages: Some(0),
        };
        assert!(parse_line("page 2", empty).is_err());
    }

    #[test]
    fn unknown_page_count_leaves_navigation_open() {
        let failed = Position {
            page: 1,
            pages: None,
        };
        assert_eq!(dispatched("page 5", failed), ControllerCommand::SetPage(5));
        assert_eq!(dispatched("next", failed), ControllerCommand::SetPage(2));
        assert!(parse_line("page 0", failed).is_err());
        assert!(HELP.contains("retries a failed load"));
    }

    #[test]
    fn blank_help_and_quit() {
        assert_eq!(parse_line("   ", MIDDLE), Ok(None));
        assert_eq!(parse_line("help", MIDDLE), Ok(Some(ReplAction::Help)));
        assert_eq!(parse_line("q", MIDDLE), Ok(Some(ReplAction::Quit)));
    }

    #[test]
    fn reports_malformed_input() {
        let err = parse_line("sort sideways", MIDDLE).expect_err("bad sort");
        assert!(err.contains("sideways"), "{err}");
        assert!(parse_line("status", MIDDLE).is_err());
        assert!(parse_line("reload now", MIDDLE).is_err());
        assert!(parse_line("page 1 2", MIDDLE).is_err());
        let err = parse_line("dance", MIDDLE).expect_err("unknown");
        assert!(err.contains("unknown command"));
    }
}
