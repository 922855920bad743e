//! Page window arithmetic shared by every repository

use crate::config::Config;
use crate::contract::{Page, PaginationError, PerPage};

/// Resolved slice of the filtered, sorted result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub page: u64,
    pub offset: u64,
    /// `None` when every row is requested
    pub limit: Option<u64>,
}

impl Window {
    /// Clamp the requested size to `max_per_page` and compute the offset.
    pub fn resolve(
        page: u64,
        per_page: Option<PerPage>,
        config: &Config,
    ) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage(page));
        }

        let per_page = per_page.unwrap_or(PerPage::Limit(config.default_per_page));
        let window = match per_page {
            PerPage::All => Self {
                page: 1,
                offset: 0,
                limit: None,
            },
            PerPage::Limit(0) => return Err(PaginationError::InvalidPerPage(0)),
            PerPage::Limit(size) => {
                let size = size.min(config.max_per_page);
                Self {
                    page,
                    offset: (page - 1).saturating_mul(size),
                    limit: Some(size),
                }
            }
        };

        Ok(window)
    }

    /// Wrap a fetched slice with the total count.
    pub fn page_of<M>(&self, items: Vec<M>, total: u64) -> Page<M> {
        let num_pages = match self.limit {
            Some(size) => total.div_ceil(size),
            None => 1,
        };

        Page {
            items,
            per_page: self.limit,
            num_pages,
            page: self.page,
            total,
        }
    }
}
