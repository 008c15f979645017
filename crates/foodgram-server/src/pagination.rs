//! Page-number pagination with `{count, next, previous, results}` bodies.

use axum::http::Uri;
use serde::Serialize;
use url::form_urlencoded;

use foodgram_core::models::{Page, PageRequest};

#[derive(Debug, Default, utoipa::IntoParams)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size, at most 100
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wrap a page, building `next` / `previous` links from the request URI.
    pub fn new(page: Page<T>, request: PageRequest, uri: &Uri) -> Self {
        let seen = request.offset() + page.items.len() as i64;
        let next = (seen < page.total).then(|| page_link(uri, request.page + 1));
        let previous = (request.page > 1).then(|| page_link(uri, request.page - 1));

        Self {
            count: page.total,
            next,
            previous,
            results: page.items,
        }
    }
}

/// The request URI with its `page` parameter replaced.
fn page_link(uri: &Uri, page: u32) -> String {
    let query = uri.query().unwrap_or_default();
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key != "page" {
            serializer.append_pair(&key, &value);
        }
    }
    serializer.append_pair("page", &page.to_string());
    format!("{}?{}", uri.path(), serializer.finish())
}
