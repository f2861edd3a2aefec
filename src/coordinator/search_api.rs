//! Search API for Searcher
//!
//! Both passes run against one store snapshot, so `total_elements` always
//! describes the same data the page was cut from. Validation failures are
//! returned before the store is opened; a store failure fails the whole
//! search rather than returning a partial page.

use tracing::{debug, warn};

use crate::entity::Searchable;
use crate::metrics::{self, LatencyTimer};
use crate::pagination::{PageRequest, PageResult};
use crate::search::{combine, match_predicate, parse_tokens, FilterSpec, Query, SortSpec};

use super::{SearchError, Searcher};

impl<E: Searchable> Searcher<E> {
    /// Run a search with already-validated paging.
    ///
    /// `terms` are raw phrases: `"quoted"` phrases match exactly, anything
    /// else is a case-insensitive substring match. An entity matches if ANY
    /// phrase matches ANY of the target's field groups; no phrases means no
    /// name constraint. Filters narrow the result; the sort is checked
    /// against the entity schema first.
    pub async fn search<S>(
        &self,
        terms: &[S],
        filters: &FilterSpec,
        sort: &SortSpec,
        page: PageRequest,
    ) -> Result<PageResult<E>, SearchError>
    where
        S: AsRef<str> + Sync,
    {
        let _timer = LatencyTimer::new(self.target.as_str());
        let result = self.execute(terms, filters, sort, page).await;
        self.record_outcome(&result);
        result
    }

    /// Run a search from raw query-string values.
    ///
    /// Page number and size are validated per [`PageRequest::parse`]; each sort
    /// entry uses the `field[,asc|desc][,ignorecase]` form.
    pub async fn search_raw<S, T>(
        &self,
        terms: &[S],
        filters: &FilterSpec,
        sort: &[T],
        page_number: Option<&str>,
        page_size: Option<&str>,
    ) -> Result<PageResult<E>, SearchError>
    where
        S: AsRef<str> + Sync,
        T: AsRef<str>,
    {
        let parsed = PageRequest::parse(page_number, page_size, &self.config)
            .map_err(SearchError::from)
            .and_then(|page| Ok((page, SortSpec::parse_all(sort)?)));

        match parsed {
            Ok((page, sort)) => self.search(terms, filters, &sort, page).await,
            Err(err) => {
                let result = Err(err);
                self.record_outcome(&result);
                result
            }
        }
    }

    /// Validate the request and build the composite predicate.
    ///
    /// Never touches the store.
    pub fn build_predicate<S: AsRef<str>>(
        &self,
        terms: &[S],
        filters: &FilterSpec,
        sort: &SortSpec,
    ) -> Result<Query, SearchError> {
        sort.validate(E::schema())?;
        let filter_query = filters
            .to_query(E::filter_fields())
            .map_err(|facet| SearchError::UnsupportedFilter {
                filter: facet.as_str(),
                entity: E::schema().entity,
            })?;
        let tokens = parse_tokens(terms);
        let predicate = combine(match_predicate(&tokens, self.target.field_groups()), filter_query);
        debug!(
            search = %self.target,
            tokens = tokens.len(),
            filtered = !filters.is_empty(),
            ?predicate,
            "Built search predicate"
        );
        Ok(predicate)
    }

    async fn execute<S: AsRef<str>>(
        &self,
        terms: &[S],
        filters: &FilterSpec,
        sort: &SortSpec,
        page: PageRequest,
    ) -> Result<PageResult<E>, SearchError> {
        let predicate = self.build_predicate(terms, filters, sort)?;

        let mut snapshot = self.store.begin_read().await?;
        let total = snapshot.count(&predicate).await?;
        let content = snapshot.page(&predicate, sort, page.window()).await?;
        if let Err(e) = snapshot.finish().await {
            // Both passes already completed on one snapshot
            warn!(search = %self.target, error = %e, "Failed to release read snapshot");
        }

        Ok(PageResult::new(content, page, total))
    }

    fn record_outcome(&self, result: &Result<PageResult<E>, SearchError>) {
        let target = self.target.as_str();
        match result {
            Ok(page) => {
                metrics::record_search_query(target, "success");
                metrics::record_search_results(target, page.total_elements, page.content.len());
                debug!(
                    search = target,
                    page = page.page_number,
                    size = page.page_size,
                    total = page.total_elements,
                    returned = page.content.len(),
                    "Search complete"
                );
            }
            Err(e) if e.is_client_error() => {
                metrics::record_search_query(target, "rejected");
                metrics::record_rejection(e.reason());
                debug!(search = target, reason = e.reason(), error = %e, "Search rejected");
            }
            Err(e) => {
                metrics::record_search_query(target, "error");
                metrics::record_store_error(E::schema().entity);
                warn!(search = target, error = %e, "Search failed");
            }
        }
    }
}
