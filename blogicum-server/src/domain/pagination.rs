use super::DomainError;
use serde::Serialize;

pub const POSTS_PER_PAGE: i64 = 10;

/// Page selected by the `page` query parameter: a 1-based number or `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl PageRequest {
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some("last") => Ok(Self::Last),
            Some(value) => value
                .parse::<i64>()
                .map(Self::Number)
                .map_err(|_| DomainError::PageNotFound),
        }
    }

    /// An empty listing still has a first page; anything past the end is
    /// "not found".
    pub fn resolve(self, total: i64, per_page: i64) -> Result<PageWindow, DomainError> {
        let num_pages = if total <= 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };
        let page = match self {
            Self::Number(n) => n,
            Self::Last => num_pages,
        };
        if page < 1 || page > num_pages {
            return Err(DomainError::PageNotFound);
        }
        Ok(PageWindow {
            page,
            num_pages,
            per_page,
            total,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
}

impl PageWindow {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            page: window.page,
            num_pages: window.num_pages,
            per_page: window.per_page,
            total: window.total,
            has_next: window.page < window.num_pages,
            has_previous: window.page > 1,
        }
    }
}
