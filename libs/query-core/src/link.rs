//! Hypermedia link synthesis.
//!
//! Link targets are known statically by the server: a [`LinkCatalog`] names the actions of
//! one resource type and a [`LinkResolver`] (the routing collaborator) turns an action plus
//! parameters into an address. A failed resolution is a routing misconfiguration.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Query parameter carrying the page number in collection links.
pub const PAGE_PARAM: &str = "page";
/// Query parameter carrying the shaping field list.
pub const FIELDS_PARAM: &str = "fields";

pub mod rel {
    pub const SELF: &str = "self";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const PARTIAL_UPDATE: &str = "partial-update";
    pub const DELETE: &str = "delete";
    pub const NEXT_PAGE: &str = "next-page";
    pub const PREVIOUS_PAGE: &str = "previous-page";
}

pub mod method {
    pub const GET: &str = "GET";
    pub const POST: &str = "POST";
    pub const PUT: &str = "PUT";
    pub const PATCH: &str = "PATCH";
    pub const DELETE: &str = "DELETE";
}

#[cfg_attr(feature = "with-utoipa", derive(utoipa::ToSchema))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDto {
    pub href: String,
    pub rel: String,
    pub method: String,
}

/// Ordered parameter bag passed to the routing collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn with_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    /// Replace the value of `name` in place, or append it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Same bag with only the page number changed.
    #[must_use]
    pub fn with_page(&self, page: u64) -> Self {
        self.clone().with(PAGE_PARAM, page.to_string())
    }

    fn page(&self) -> u64 {
        self.get(PAGE_PARAM)
            .and_then(|p| p.parse().ok())
            .unwrap_or(1)
    }
}

/// Routing collaborator: resolves a named action (optionally scoped to a resource group)
/// plus parameters into an absolute or root-relative address.
pub trait LinkResolver: Send + Sync {
    fn resolve(&self, action: &str, scope: Option<&str>, params: &QueryParams) -> Option<String>;
}

/// One available action on a single resource.
#[derive(Clone, Debug)]
pub struct LinkTemplate {
    pub action: &'static str,
    pub rel: &'static str,
    pub method: &'static str,
    /// Carry the caller's `fields` so following the link reproduces the same shape.
    pub echo_fields: bool,
}

impl LinkTemplate {
    pub const fn new(action: &'static str, rel: &'static str, method: &'static str) -> Self {
        Self {
            action,
            rel,
            method,
            echo_fields: false,
        }
    }

    #[must_use]
    pub const fn echo_fields(mut self) -> Self {
        self.echo_fields = true;
        self
    }
}

/// Actions available for one resource type.
#[derive(Clone, Debug)]
pub struct LinkCatalog {
    pub scope: Option<&'static str>,
    /// Parameter name carrying the resource identity in single-resource routes.
    pub id_param: &'static str,
    pub resource: Vec<LinkTemplate>,
    pub list_action: &'static str,
    pub create_action: Option<&'static str>,
}

/// Builds link descriptors for one resource type against a routing collaborator.
pub struct LinkSynthesizer<'a> {
    resolver: &'a dyn LinkResolver,
    catalog: &'a LinkCatalog,
}

impl<'a> LinkSynthesizer<'a> {
    pub fn new(resolver: &'a dyn LinkResolver, catalog: &'a LinkCatalog) -> Self {
        Self { resolver, catalog }
    }

    pub fn create(
        &self,
        action: &str,
        rel: &str,
        method: &str,
        params: &QueryParams,
    ) -> Result<LinkDto, Error> {
        let scope = self.catalog.scope;
        let href = self.resolver.resolve(action, scope, params).ok_or_else(|| {
            tracing::error!(action, ?scope, "link target could not be resolved");
            Error::link_resolution(action, scope)
        })?;
        Ok(LinkDto {
            href,
            rel: rel.to_owned(),
            method: method.to_owned(),
        })
    }

    /// One link per available action on the resource `id`.
    pub fn resource_links(&self, id: &str, fields: Option<&str>) -> Result<Vec<LinkDto>, Error> {
        let fields = fields.map(str::trim).filter(|f| !f.is_empty());
        self.catalog
            .resource
            .iter()
            .map(|t| {
                let params = QueryParams::new().with(self.catalog.id_param, id);
                let params = if t.echo_fields {
                    params.with_opt(FIELDS_PARAM, fields)
                } else {
                    params
                };
                self.create(t.action, t.rel, t.method, &params)
            })
            .collect()
    }

    /// Self and create links, plus page navigation when available.
    ///
    /// Navigation links echo every parameter of `params` and change only the page number.
    pub fn collection_links(
        &self,
        params: &QueryParams,
        has_next_page: bool,
        has_previous_page: bool,
    ) -> Result<Vec<LinkDto>, Error> {
        let list = self.catalog.list_action;
        let mut links = vec![self.create(list, rel::SELF, method::GET, params)?];

        if let Some(create) = self.catalog.create_action {
            links.push(self.create(create, rel::CREATE, method::POST, &QueryParams::new())?);
        }

        let page = params.page();
        if has_next_page {
            links.push(self.create(list, rel::NEXT_PAGE, method::GET, &params.with_page(page + 1))?);
        }
        if has_previous_page {
            links.push(self.create(
                list,
                rel::PREVIOUS_PAGE,
                method::GET,
                &params.with_page(page.saturating_sub(1).max(1)),
            )?);
        }
        Ok(links)
    }
}
