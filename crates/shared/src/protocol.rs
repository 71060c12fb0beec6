use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Character, CharacterStatus},
    error::ParseError,
};

/// Pagination metadata returned with every collection page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u64,
    pub pages: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

impl PageInfo {
    /// Info for a collection that is held locally in full: one page, no links.
    pub fn single(count: usize) -> Self {
        Self {
            count: count as u64,
            pages: u32::from(count > 0),
            next: None,
            prev: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next.is_none()
    }

    pub fn is_first(&self) -> bool {
        self.prev.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    NameAsc,
    NameDesc,
    DateAsc,
    DateDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::DateAsc,
        SortOption::DateDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NameAsc => "Name (A - Z)",
            Self::NameDesc => "Name (Z - A)",
            Self::DateAsc => "Date Created (Oldest First)",
            Self::DateDesc => "Date Created (Newest First)",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == normalized)
            .ok_or_else(|| ParseError::SortOption(raw.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Alive,
    Dead,
    Unknown,
}

impl StatusFilter {
    pub fn status(self) -> Option<CharacterStatus> {
        match self {
            Self::All => None,
            Self::Alive => Some(CharacterStatus::Alive),
            Self::Dead => Some(CharacterStatus::Dead),
            Self::Unknown => Some(CharacterStatus::Unknown),
        }
    }

    pub fn matches(self, status: CharacterStatus) -> bool {
        self.status().map_or(true, |wanted| wanted == status)
    }

    pub fn as_str(self) -> &'static str {
        match self.status() {
            Some(status) => status.as_str(),
            None => "all",
        }
    }
}

impl From<Option<CharacterStatus>> for StatusFilter {
    fn from(value: Option<CharacterStatus>) -> Self {
        match value {
            None => Self::All,
            Some(CharacterStatus::Alive) => Self::Alive,
            Some(CharacterStatus::Dead) => Self::Dead,
            Some(CharacterStatus::Unknown) => Self::Unknown,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        raw.parse::<CharacterStatus>()
            .map(|status| Self::from(Some(status)))
            .map_err(|_| ParseError::StatusFilter(raw.to_string()))
    }
}

/// What a single fetch asks the collection for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchQuery {
    /// Every page, following `next` links from the collection root.
    All,
    /// One server-side page, optionally filtered by status on the server.
    Page {
        page: u32,
        status: Option<CharacterStatus>,
    },
}
