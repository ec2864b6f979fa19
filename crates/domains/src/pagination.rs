//! Page/offset arithmetic for list endpoints.
//!
//! `page` is 1-based. A parameter that is absent from the request takes its default;
//! a parameter that is present but not a positive integer is a validation error.

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_SIZE: u32 = 10;

/// A validated `(page, size)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> DomainResult<Self> {
        Self::checked(positive("page", page)?, positive("size", size)?)
    }

    /// Builds a request from raw query-string values.
    pub fn from_query(page: Option<&str>, size: Option<&str>) -> DomainResult<Self> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => positive("page", parse_int("page", raw)?)?,
        };
        let size = match size {
            None => DEFAULT_SIZE,
            Some(raw) => positive("size", parse_int("size", raw)?)?,
        };
        Self::checked(page, size)
    }

    /// Rejects pairs whose row offset does not fit the store's signed 64-bit OFFSET.
    fn checked(page: u32, size: u32) -> DomainResult<Self> {
        (i64::from(page) - 1)
            .checked_mul(i64::from(size))
            .ok_or_else(|| {
                DomainError::validation(format!("page {page} with size {size} is out of range"))
            })?;
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Rows to skip: `(page - 1) * size`.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

fn parse_int(field: &str, raw: &str) -> DomainResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| DomainError::validation(format!("{field} must be an integer, got {raw:?}")))
}

fn positive(field: &str, value: i64) -> DomainResult<u32> {
    if value < 1 {
        return Err(DomainError::validation(format!(
            "{field} must be >= 1, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| DomainError::validation(format!("{field} is too large: {value}")))
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total_count: u64,
    pub total_pages: u64,
    pub page: u32,
    pub size: u32,
    pub has_more: bool,
}

impl PageMeta {
    pub fn new(req: PageRequest, total_count: u64) -> Self {
        let size = u64::from(req.size);
        Self {
            total_count,
            total_pages: total_count.div_ceil(size),
            page: req.page,
            size: req.size,
            has_more: u64::from(req.page) * size < total_count,
        }
    }
}
