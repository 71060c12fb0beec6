//! List controller: owns the listing state, decides when a fetch is needed,
//! and publishes a consistent [`Snapshot`] after every change.
//!
//! The controller never performs I/O itself. Operations that need data hand
//! back a [`FetchRequest`]; whoever executes it reports the outcome through
//! [`ListController::complete`]. Every request carries a sequence number and
//! only the most recent one may change state, so a slow response for old
//! parameters can never overwrite newer data.

use std::{fmt, str::FromStr};

use shared::{
    domain::Character,
    protocol::{CharacterPage, FetchQuery, PageInfo, SortOption, StatusFilter},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{error::NetworkError, view::derive_view};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load characters. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Pull the whole collection once; filtering, sorting and paging are local.
    #[default]
    Eager,
    /// One server page per fetch; the server filters by status.
    SinglePage,
}

impl FetchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eager => "eager",
            Self::SinglePage => "single-page",
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fetch mode '{0}' (expected eager or single-page)")]
pub struct UnknownFetchMode(pub String);

impl FromStr for FetchMode {
    type Err = UnknownFetchMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "eager" | "all" => Ok(Self::Eager),
            "single-page" | "page" | "paged" => Ok(Self::SinglePage),
            _ => Err(UnknownFetchMode(raw.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

impl Phase {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// User-controlled parameters a controller starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub sort: SortOption,
    pub status_filter: StatusFilter,
    pub page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            sort: SortOption::default(),
            status_filter: StatusFilter::default(),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    /// Characters exactly as the last successful fetch returned them.
    pub entities: Vec<Character>,
    pub page_info: Option<PageInfo>,
    pub sort: SortOption,
    pub status_filter: StatusFilter,
    pub current_page: u32,
    pub phase: Phase,
    pub error: Option<String>,
}

impl ControllerState {
    fn new(params: ListParams) -> Self {
        Self {
            entities: Vec::new(),
            page_info: None,
            sort: params.sort,
            status_filter: params.status_filter,
            current_page: params.page.max(1),
            phase: Phase::Idle,
            error: None,
        }
    }
}

/// What the renderer gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Filtered and sorted view of the held characters.
    pub entities: Vec<Character>,
    pub page_info: Option<PageInfo>,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: Phase,
    pub sort: SortOption,
    pub status_filter: StatusFilter,
    pub current_page: u32,
}

impl Snapshot {
    pub fn shows_empty_notice(&self) -> bool {
        self.entities.is_empty() && !self.loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: FetchQuery,
}

pub struct ListController {
    mode: FetchMode,
    state: ControllerState,
    view: Vec<Character>,
    latest_seq: u64,
    publisher: watch::Sender<Snapshot>,
}

impl ListController {
    pub fn new(mode: FetchMode) -> Self {
        Self::with_params(mode, ListParams::default())
    }

    pub fn with_params(mode: FetchMode, params: ListParams) -> Self {
        let state = ControllerState::new(params);
        let (publisher, _) = watch::channel(build_snapshot(&state, &[]));
        Self {
            mode,
            state,
            view: Vec::new(),
            latest_seq: 0,
            publisher,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        build_snapshot(&self.state, &self.view)
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    pub fn activate(&mut self) -> FetchRequest {
        info!(mode = %self.mode, "activating list controller");
        self.begin_fetch()
    }

    /// Explicit retry with the current parameters. Failures are never retried
    /// automatically.
    pub fn reload(&mut self) -> FetchRequest {
        self.begin_fetch()
    }

    /// Re-sorts the held characters; never fetches.
    pub fn set_sort_option(&mut self, sort: SortOption) {
        if self.state.sort == sort {
            return;
        }
        debug!(%sort, "sort option changed");
        self.state.sort = sort;
        self.refresh_view();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) -> Option<FetchRequest> {
        if self.state.status_filter == filter {
            return None;
        }
        debug!(%filter, "status filter changed");
        self.state.status_filter = filter;
        // Page boundaries belong to the previous filter.
        self.state.current_page = 1;

        match self.mode {
            FetchMode::Eager => {
                self.refresh_view();
                None
            }
            FetchMode::SinglePage => Some(self.begin_fetch()),
        }
    }

    /// In single-page mode fetches page `page`; in eager mode only records
    /// the page for local pagination.
    pub fn set_page(&mut self, page: u32) -> Option<FetchRequest> {
        if page == 0 {
            warn!("ignoring request for page 0");
            return None;
        }
        if page == self.state.current_page {
            return None;
        }

        match self.mode {
            FetchMode::Eager => {
                self.state.current_page = page;
                self.publish();
                None
            }
            FetchMode::SinglePage => {
                if let Some(info) = &self.state.page_info {
                    if info.pages > 0 && page > info.pages {
                        warn!(page, pages = info.pages, "ignoring request past the last page");
                        return None;
                    }
                }
                self.state.current_page = page;
                Some(self.begin_fetch())
            }
        }
    }

    /// Applies the outcome of the fetch tagged `seq`. Returns `false` when the
    /// result was discarded because a newer fetch has been issued since.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<CharacterPage, NetworkError>,
    ) -> bool {
        if seq != self.latest_seq || self.state.phase != Phase::Loading {
            debug!(seq, latest = self.latest_seq, "discarding stale fetch result");
            return false;
        }

        match result {
            Ok(page) => {
                info!(
                    seq,
                    characters = page.results.len(),
                    count = page.info.count,
                    pages = page.info.pages,
                    "fetch completed"
                );
                self.state.entities = page.results;
                self.state.page_info = Some(page.info);
                self.state.error = None;
                self.state.phase = Phase::Ready;
            }
            Err(err) => {
                warn!(seq, status = ?err.status_code(), error = %err, "fetch failed");
                self.state.entities.clear();
                self.state.page_info = None;
                self.state.error = Some(LOAD_FAILED_MESSAGE.to_string());
                self.state.phase = Phase::Failed;
            }
        }

        self.refresh_view();
        true
    }

    fn begin_fetch(&mut self) -> FetchRequest {
        self.latest_seq += 1;
        let query = match self.mode {
            FetchMode::Eager => FetchQuery::All,
            FetchMode::SinglePage => FetchQuery::Page {
                page: self.state.current_page,
                status: self.state.status_filter.status(),
            },
        };
        self.state.phase = Phase::Loading;
        debug!(seq = self.latest_seq, ?query, "issuing fetch");
        self.publish();

        FetchRequest {
            seq: self.latest_seq,
            query,
        }
    }

    fn refresh_view(&mut self) {
        // In single-page mode the server already applied the status filter.
        let filter = match self.mode {
            FetchMode::Eager => self.state.status_filter,
            FetchMode::SinglePage => StatusFilter::All,
        };
        self.view = derive_view(&self.state.entities, self.state.sort, filter);
        self.publish();
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}

fn build_snapshot(state: &ControllerState, view: &[Character]) -> Snapshot {
    Snapshot {
        entities: view.to_vec(),
        page_info: state.page_info.clone(),
        loading: state.phase == Phase::Loading,
        error: state.error.clone(),
        phase: state.phase,
        sort: state.sort,
        status_filter: state.status_filter,
        current_page: state.current_page,
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
