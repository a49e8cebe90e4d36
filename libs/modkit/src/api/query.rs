//! Collection query extraction: `page`, `pageSize`, `sort` and `fields`.
//!
//! The extractor clamps paging values and enforces length budgets; it does not validate
//! sort keys or field names, which depend on the resource type and are checked by the
//! handler against its sort mapping definition and field descriptor.

use axum::extract::{FromRequestParts, Query};
use axum::http::{request::Parts, StatusCode};
use query_core::{PageRequest, QueryParams};
use serde::Deserialize;
use std::ops::Deref;

use crate::api::problem::{Problem, ProblemResponse};

pub const MAX_SORT_LEN: usize = 1024;
pub const MAX_FIELDS_LEN: usize = 1024;
pub const MAX_SORT_TOKENS: usize = 10;

pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "pageSize";
pub const SORT: &str = "sort";
pub const FIELDS: &str = "fields";

/// Paging bounds of one module. Put it in request extensions (`Extension(limits)`)
/// for [`CollectionQuery`] to pick up; defaults apply otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl PageLimits {
    fn clamp_page_size(&self, requested: Option<i64>) -> u64 {
        let max = self.max_page_size.max(1);
        match requested {
            None => self.default_page_size.clamp(1, max),
            Some(n) if n < 1 => 1,
            Some(n) => u64::try_from(n).unwrap_or(max).min(max),
        }
    }
}

/// Raw query string values, kept as text so malformed numbers get a problem response.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionParams {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
    pub sort: Option<String>,
    pub fields: Option<String>,
}

/// Clamped collection query shared by every list endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionQuery {
    pub page: u64,
    pub page_size: u64,
    pub sort: Option<String>,
    pub fields: Option<String>,
}

impl CollectionQuery {
    pub fn parse(params: CollectionParams, limits: PageLimits) -> Result<Self, ProblemResponse> {
        let page = parse_int(PAGE, params.page.as_deref())?
            .map(|p| u64::try_from(p.max(1)).unwrap_or(1))
            .unwrap_or(1);
        let page_size = limits.clamp_page_size(parse_int(PAGE_SIZE, params.page_size.as_deref())?);

        let sort = non_blank(params.sort);
        if let Some(sort) = sort.as_deref() {
            check_len(SORT, sort, MAX_SORT_LEN)?;
            let tokens = sort.split(',').filter(|t| !t.trim().is_empty()).count();
            if tokens > MAX_SORT_TOKENS {
                return Err(budget_problem(format!(
                    "The sort parameter has {tokens} keys; at most {MAX_SORT_TOKENS} are allowed"
                )));
            }
        }

        let fields = non_blank(params.fields);
        if let Some(fields) = fields.as_deref() {
            check_len(FIELDS, fields, MAX_FIELDS_LEN)?;
        }

        Ok(Self {
            page,
            page_size,
            sort,
            fields,
        })
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn fields(&self) -> Option<&str> {
        self.fields.as_deref()
    }

    /// Parameter bag echoed by collection links: resource filters first (absent ones
    /// dropped), then `sort`, `fields`, `page`, `pageSize`.
    pub fn link_params<'a, I>(&self, filters: I) -> QueryParams
    where
        I: IntoIterator<Item = (&'a str, Option<String>)>,
    {
        let mut params = QueryParams::new();
        for (name, value) in filters {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                params.set(name, v);
            }
        }
        params
            .with_opt(SORT, self.sort.clone())
            .with_opt(FIELDS, self.fields.clone())
            .with(PAGE, self.page.to_string())
            .with(PAGE_SIZE, self.page_size.to_string())
    }
}

impl<S> FromRequestParts<S> for CollectionQuery
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<CollectionParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| malformed_query(&e.body_text()))?;
        let limits = parts
            .extensions
            .get::<PageLimits>()
            .copied()
            .unwrap_or_default();
        Self::parse(params, limits).map_err(|p| with_instance(p, parts))
    }
}

/// `fields` for single-resource reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShapeQuery(pub Option<String>);

impl ShapeQuery {
    pub fn fields(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl Deref for ShapeQuery {
    type Target = Option<String>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Deserialize)]
struct ShapeParams {
    fields: Option<String>,
}

impl<S> FromRequestParts<S> for ShapeQuery
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<ShapeParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| malformed_query(&e.body_text()))?;
        let fields = non_blank(params.fields);
        if let Some(f) = fields.as_deref() {
            check_len(FIELDS, f, MAX_FIELDS_LEN).map_err(|p| with_instance(p, parts))?;
        }
        Ok(Self(fields))
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn parse_int(name: &str, raw: Option<&str>) -> Result<Option<i64>, ProblemResponse> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(|_| {
            Problem::from_parts(
                StatusCode::BAD_REQUEST,
                "INVALID_QUERY",
                "Invalid query parameter",
                format!("The '{name}' parameter must be an integer, got '{s}'"),
                "",
            )
            .into()
        }),
    }
}

fn check_len(name: &str, value: &str, max: usize) -> Result<(), ProblemResponse> {
    if value.len() > max {
        return Err(budget_problem(format!(
            "The '{name}' parameter is too long ({} > {max} characters)",
            value.len()
        )));
    }
    Ok(())
}

fn budget_problem(detail: String) -> ProblemResponse {
    Problem::from_parts(
        StatusCode::BAD_REQUEST,
        "QUERY_TOO_COMPLEX",
        "Query parameter over budget",
        detail,
        "",
    )
    .into()
}

fn malformed_query(detail: &str) -> ProblemResponse {
    Problem::from_parts(
        StatusCode::BAD_REQUEST,
        "INVALID_QUERY",
        "Invalid query string",
        detail,
        "",
    )
    .into()
}

fn with_instance(mut p: ProblemResponse, parts: &Parts) -> ProblemResponse {
    p.0.instance = parts.uri.path().to_owned();
    p
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod query_tests;
