use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::LinkDto;

/// Page number and size, already clamped by the boundary layer (`page >= 1`, `page_size >= 1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// An already filtered and ordered sequence the accountant can count and slice.
///
/// The two reads are independent; nothing ties them to one snapshot.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;
    type Error: Send;

    async fn count(&self) -> Result<u64, Self::Error>;

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Paginated envelope.
#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult<T> {
    items: Vec<T>,
    page: u64,
    page_size: u64,
    total_count: u64,
    has_previous_page: bool,
    has_next_page: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    links: Vec<LinkDto>,
}

impl<T> PaginationResult<T> {
    /// Assemble an envelope; `items` beyond `page_size` are dropped.
    pub fn new(mut items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        let page_size = request.page_size;
        items.truncate(usize::try_from(page_size).unwrap_or(usize::MAX));
        Self {
            items,
            page: request.page,
            page_size,
            total_count,
            has_previous_page: request.page > 1,
            has_next_page: request.page.saturating_mul(page_size) < total_count,
            links: Vec::new(),
        }
    }

    /// Count and slice `source` for the requested page.
    ///
    /// Both reads are issued concurrently; a storage failure propagates unchanged.
    pub async fn create<S>(source: &S, request: PageRequest) -> Result<Self, S::Error>
    where
        S: PageSource<Item = T> + ?Sized,
    {
        let (total_count, items) = futures::try_join!(
            source.count(),
            source.fetch(request.offset(), request.limit())
        )?;
        tracing::debug!(
            page = request.page,
            page_size = request.page_size,
            total_count,
            fetched = items.len(),
            "page assembled"
        );
        Ok(Self::new(items, request, total_count))
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn has_previous_page(&self) -> bool {
        self.has_previous_page
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn links(&self) -> &[LinkDto] {
        &self.links
    }

    pub fn with_links(mut self, links: Vec<LinkDto>) -> Self {
        self.links = links;
        self
    }

    /// Map items while preserving the page accounting (Domain->DTO mapping convenience)
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> PaginationResult<U> {
        PaginationResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            links: self.links,
        }
    }

    /// Fallible variant of [`map_items`](Self::map_items), used for shaping.
    pub fn try_map_items<U, E>(
        self,
        f: impl FnOnce(Vec<T>) -> Result<Vec<U>, E>,
    ) -> Result<PaginationResult<U>, E> {
        Ok(PaginationResult {
            items: f(self.items)?,
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
            links: self.links,
        })
    }
}
