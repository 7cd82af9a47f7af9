//! OData-style query options and a helper that walks every page.

use crate::error::ApiError;

/// Page size used when the caller does not configure one.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// `$top`, `$skip` and `$filter` for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub top: Option<usize>,
    pub skip: Option<usize>,
    pub filter: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filtered(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Self::default()
        }
    }

    /// Same filter, positioned at one page.
    pub fn page(&self, top: usize, skip: usize) -> Self {
        Self {
            top: Some(top),
            skip: Some(skip),
            filter: self.filter.clone(),
        }
    }

    /// Query-string pairs in the order the API documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(top) = self.top {
            out.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip {
            out.push(("$skip", skip.to_string()));
        }
        if let Some(filter) = &self.filter {
            out.push(("$filter", filter.clone()));
        }
        out
    }
}

/// Fetch every page of a list endpoint.
///
/// Pages are requested `page_size` at a time and the walk stops at the
/// first page shorter than that. A page size of zero is treated as one.
pub fn fetch_all<T, F>(page_size: usize, base: &Query, mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(&Query) -> Result<Vec<T>, ApiError>,
{
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut skip = 0;
    loop {
        let page = fetch(&base.page(page_size, skip))?;
        let len = page.len();
        all.extend(page);
        if len < page_size {
            break;
        }
        skip += page_size;
    }
    tracing::debug!("fetched {} record(s) in pages of {page_size}", all.len());
    Ok(all)
}
