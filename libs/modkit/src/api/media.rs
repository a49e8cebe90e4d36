//! Media-type negotiation between the plain and the hypermedia representation.
//!
//! A media range of the form `application/vnd.<vendor>.hateoas[.<n>]+json` in `Accept`
//! selects the hypermedia representation; anything else gets plain JSON.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::convert::Infallible;

pub const APPLICATION_JSON: &str = "application/json";

/// Negotiated response representation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Representation {
    hypermedia: Option<String>,
}

impl Representation {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn from_accept(accept: Option<&str>) -> Self {
        let hypermedia = accept.and_then(|a| {
            a.split(',')
                .map(|range| range.split(';').next().unwrap_or_default().trim())
                .find(|media| is_hypermedia(media))
                .map(str::to_ascii_lowercase)
        });
        Self { hypermedia }
    }

    /// Whether links belong in the serialized body.
    pub fn include_links(&self) -> bool {
        self.hypermedia.is_some()
    }

    pub fn content_type(&self) -> &str {
        self.hypermedia.as_deref().unwrap_or(APPLICATION_JSON)
    }

    /// JSON body with the negotiated `Content-Type`.
    pub fn respond<T: Serialize>(&self, status: StatusCode, body: &T) -> Response {
        let mut resp = (status, Json(body)).into_response();
        if let Some(media) = &self.hypermedia {
            if let Ok(value) = HeaderValue::from_str(media) {
                resp.headers_mut().insert(header::CONTENT_TYPE, value);
            }
        }
        resp
    }
}

/// `application/vnd.<vendor>.hateoas+json` or `application/vnd.<vendor>.hateoas.<n>+json`.
fn is_hypermedia(media: &str) -> bool {
    let media = media.to_ascii_lowercase();
    let Some(subtype) = media.strip_prefix("application/vnd.") else {
        return false;
    };
    let Some(subtype) = subtype.strip_suffix("+json") else {
        return false;
    };
    let mut segments = subtype.split('.');
    let vendor = segments.next().unwrap_or_default();
    if vendor.is_empty() || segments.next() != Some("hateoas") {
        return false;
    }
    match (segments.next(), segments.next()) {
        (None, _) => true,
        (Some(v), None) => !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}

impl<S> FromRequestParts<S> for Representation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok());
        Ok(Self::from_accept(accept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_has_no_links() {
        for accept in [None, Some("application/json"), Some("*/*"), Some("application/json;v=2")] {
            let r = Representation::from_accept(accept);
            assert!(!r.include_links());
            assert_eq!(r.content_type(), APPLICATION_JSON);
        }
    }

    #[test]
    fn vendor_hateoas_media_types_select_links() {
        for media in [
            "application/vnd.devhabit.hateoas+json",
            "application/vnd.devhabit.hateoas.1+json",
            "application/vnd.acme.hateoas.2+json",
        ] {
            let r = Representation::from_accept(Some(media));
            assert!(r.include_links(), "{media}");
            assert_eq!(r.content_type(), media);
        }
    }

    #[test]
    fn first_hypermedia_range_wins_and_params_are_dropped() {
        let r = Representation::from_accept(Some(
            "text/html, application/vnd.devhabit.hateoas.2+json;q=0.9, application/json",
        ));
        assert_eq!(r.content_type(), "application/vnd.devhabit.hateoas.2+json");
    }

    #[test]
    fn lookalikes_are_rejected() {
        for media in [
            "application/vnd.hateoas+json",
            "application/vnd.devhabit.hateoas.x+json",
            "application/vnd.devhabit.hateoas.1.2+json",
            "application/vnd.devhabit.hateoas+xml",
        ] {
            assert!(!Representation::from_accept(Some(media)).include_links(), "{media}");
        }
    }

    #[test]
    fn respond_echoes_media_type() {
        let r = Representation::from_accept(Some("application/vnd.devhabit.hateoas+json"));
        let resp = r.respond(StatusCode::CREATED, &serde_json::json!({"id": "t_1"}));
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/vnd.devhabit.hateoas+json"
        );
    }
}
