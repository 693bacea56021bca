// src/search/source.rs
// =============================================================================
// The seam between the session and whatever produces search pages.
//
// The real implementation is GitHubClient. Tests plug in scripted sources so
// the pagination logic can be exercised without a network.
// =============================================================================

use futures::future::BoxFuture;

use crate::github::{FetchError, GitHubClient, SearchPage};

/// Something that can return one page of search results.
///
/// The returned future must be `Send` because the session runs each fetch as
/// its own task.
pub trait PageSource: Send + Sync + 'static {
    fn load_page<'a>(
        &'a self,
        term: &'a str,
        page: u32,
    ) -> BoxFuture<'a, Result<SearchPage, FetchError>>;
}

impl PageSource for GitHubClient {
    fn load_page<'a>(
        &'a self,
        term: &'a str,
        page: u32,
    ) -> BoxFuture<'a, Result<SearchPage, FetchError>> {
        Box::pin(self.fetch_page(term, page))
    }
}
