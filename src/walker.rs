use std::collections::{HashSet, VecDeque};
use std::iter::FusedIterator;

use tracing::{debug, info};
use url::Url;

use crate::carrier::{Pagination, PolicyListing};
use crate::document::{DocumentTree, Fetch};
use crate::error::{PaginationError, ScrapeError};
use crate::parser::extract;
use crate::records::Policy;

/// Pull-based walk over a carrier's policy pages.
///
/// A page's records are extracted when the page is loaded and the tree is
/// dropped right after; the next page is fetched only once those records
/// have been consumed. The walk stops for good after the last page or the
/// first error, and cannot be restarted.
pub struct PolicyWalker<'a, F: ?Sized> {
    listing: &'a PolicyListing,
    host: &'a Url,
    fetcher: &'a F,
    buffered: VecDeque<Result<Policy, ScrapeError>>,
    next: Option<Url>,
    visited: HashSet<Url>,
    pages: usize,
    done: bool,
}

impl<'a, F: Fetch + ?Sized> PolicyWalker<'a, F> {
    pub fn new(
        listing: &'a PolicyListing,
        host: &'a Url,
        fetcher: &'a F,
        first: DocumentTree,
    ) -> Self {
        let mut walker = PolicyWalker {
            listing,
            host,
            fetcher,
            buffered: VecDeque::new(),
            next: None,
            visited: HashSet::new(),
            pages: 0,
            done: false,
        };
        walker.load(first);
        walker
    }

    /// Pages loaded so far, including the first.
    pub fn pages(&self) -> usize {
        self.pages
    }

    fn load(&mut self, page: DocumentTree) {
        self.pages += 1;
        self.visited.insert(page.uri().clone());
        let root = page.root();

        let kind = self.listing.kind;
        let before = self.buffered.len();
        for node in root.select(&self.listing.container) {
            let record = extract::<Policy>(node, &self.listing.schema)
                .map(|policy| Policy { kind, ..policy })
                .map_err(ScrapeError::from);
            self.buffered.push_back(record);
        }
        debug!(
            page = self.pages,
            uri = %page.uri(),
            records = self.buffered.len() - before,
            "loaded policy page"
        );

        self.next = None;
        if let Pagination::NextLink(rule) = &self.listing.pagination {
            match rule.next_page(root, self.host) {
                Ok(Some(uri)) if self.visited.contains(&uri) => {
                    let err = PaginationError::Cycle {
                        uri: uri.to_string(),
                    };
                    self.buffered.push_back(Err(err.into()));
                }
                Ok(next) => self.next = next,
                Err(e) => self.buffered.push_back(Err(e.into())),
            }
        }
    }
}

impl<F: Fetch + ?Sized> Iterator for PolicyWalker<'_, F> {
    type Item = Result<Policy, ScrapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some(item) = self.buffered.pop_front() {
                if item.is_err() {
                    self.done = true;
                    self.buffered.clear();
                    self.next = None;
                }
                return Some(item);
            }

            let Some(uri) = self.next.take() else {
                self.done = true;
                return None;
            };

            info!(page = self.pages + 1, %uri, "fetching policy page");
            match self.fetcher.fetch(&uri) {
                Ok(page) => self.load(page),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl<F: Fetch + ?Sized> FusedIterator for PolicyWalker<'_, F> {}
