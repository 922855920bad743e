//! Contract models for paginated access

use super::error::PaginationError;
use crate::query::{FilterNode, SortDirective};
use serde::{Deserialize, Serialize};

/// Page size; `-1` on the wire requests every row in one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PerPage {
    All,
    Limit(u64),
}

impl TryFrom<i64> for PerPage {
    type Error = PaginationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::All),
            n if n > 0 => Ok(Self::Limit(n.unsigned_abs())),
            n => Err(PaginationError::InvalidPerPage(n)),
        }
    }
}

impl From<PerPage> for i64 {
    fn from(value: PerPage) -> Self {
        match value {
            PerPage::All => -1,
            PerPage::Limit(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

/// Paginate call: window plus optional criteria and ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageRequest {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,

    /// Page size; the repository default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<PerPage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortDirective>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(default_page())
    }
}

impl PageRequest {
    pub fn new(page: u64) -> Self {
        Self {
            page,
            per_page: None,
            filter: None,
            sort: Vec::new(),
        }
    }

    pub fn with_per_page(mut self, per_page: PerPage) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortDirective>) -> Self {
        self.sort = sort;
        self
    }
}

fn default_page() -> u64 {
    1
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<M> {
    pub items: Vec<M>,
    /// Effective page size after clamping; `None` when every row was requested
    pub per_page: Option<u64>,
    pub num_pages: u64,
    pub page: u64,
    /// Matches across all pages
    pub total: u64,
}

impl<M> Page<M> {
    pub fn map<N>(self, f: impl FnMut(M) -> N) -> Page<N> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            per_page: self.per_page,
            num_pages: self.num_pages,
            page: self.page,
            total: self.total,
        }
    }
}
