use std::collections::HashMap;

use query_core::{LinkResolver, QueryParams};

/// Named-route table resolving `(scope, action)` plus parameters into addresses.
///
/// Templates use `{param}` placeholders. Parameters not consumed by the template are
/// appended as a percent-encoded query string, in bag order.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    base_url: Option<String>,
    routes: HashMap<(Option<String>, String), String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every address with an absolute base (e.g. `https://api.example.com`).
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        self.base_url = base_url
            .map(|b| b.trim().trim_end_matches('/').to_owned())
            .filter(|b| !b.is_empty());
        self
    }

    #[must_use]
    pub fn route(mut self, scope: Option<&str>, action: &str, template: &str) -> Self {
        self.insert(scope, action, template);
        self
    }

    pub fn insert(&mut self, scope: Option<&str>, action: &str, template: &str) {
        self.routes.insert(
            (scope.map(str::to_owned), action.to_owned()),
            template.to_owned(),
        );
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn render(&self, template: &str, params: &QueryParams) -> Option<String> {
        let mut path = String::with_capacity(template.len());
        let mut consumed: Vec<&str> = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            path.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}')?;
            let name = &after[..close];
            let value = params.get(name)?;
            path.push_str(&urlencoding::encode(value));
            consumed.push(name);
            rest = &after[close + 1..];
        }
        path.push_str(rest);

        let query: Vec<String> = params
            .iter()
            .filter(|(n, _)| !consumed.contains(n))
            .map(|(n, v)| format!("{}={}", urlencoding::encode(n), urlencoding::encode(v)))
            .collect();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }

        Some(match &self.base_url {
            Some(base) => format!("{base}{path}"),
            None => path,
        })
    }
}

impl LinkResolver for RouteTable {
    fn resolve(&self, action: &str, scope: Option<&str>, params: &QueryParams) -> Option<String> {
        let template = self
            .routes
            .get(&(scope.map(str::to_owned), action.to_owned()))?;
        self.render(template, params)
    }
}
