use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload the collection API returns alongside non-2xx responses,
/// e.g. `{"error": "There is nothing here"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown character status '{0}' (expected alive, dead or unknown)")]
    Status(String),
    #[error("unknown status filter '{0}' (expected all, alive, dead or unknown)")]
    StatusFilter(String),
    #[error("unknown sort option '{0}' (expected name-asc, name-desc, date-asc or date-desc)")]
    SortOption(String),
}
