use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction accepted by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let limit_i = i64::from(limit.max(1));
        Self {
            docs,
            total,
            page,
            limit,
            pages: (total + limit_i - 1) / limit_i,
        }
    }
}

/// Normalizes raw `page`/`limit` query values.
///
/// Pages are 1-based; the limit is clamped to `1..=MAX_PAGE_SIZE`.
/// Returns `(page, limit, offset)`.
pub fn normalize(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = i64::from(page - 1) * i64::from(limit);
    (page, limit, offset)
}
