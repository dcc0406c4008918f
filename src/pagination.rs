use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::ServiceError;

/// Page selection for list operations. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PageRequest {
    #[validate(range(min = 1))]
    pub page: u64,
    #[validate(range(min = 1))]
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// First page at the configured default size.
    pub fn first(config: &AppConfig) -> Self {
        Self::new(1, config.default_page_size)
    }

    /// Validates the request and rejects page sizes above `max_per_page`.
    pub fn checked(self, max_per_page: u64) -> Result<Self, ServiceError> {
        self.validate()?;
        if self.per_page > max_per_page {
            return Err(ServiceError::InvalidInput(format!(
                "per_page must not exceed {}",
                max_per_page
            )));
        }
        Ok(self)
    }
}

/// One page of results with the bookkeeping a client needs to walk the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub max_page: u64,
    pub count: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, count: u64) -> Self {
        Self {
            data,
            page: request.page,
            per_page: request.per_page,
            max_page: max_page(count, request.per_page),
            count,
        }
    }

    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            max_page: self.max_page,
            count: self.count,
        }
    }
}

/// Number of pages needed for `count` rows, zero when there are none.
pub fn max_page(count: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    count.div_ceil(per_page)
}
