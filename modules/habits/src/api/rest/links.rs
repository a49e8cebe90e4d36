use once_cell::sync::Lazy;
use query_core::link::{method, rel};
use query_core::{LinkCatalog, LinkTemplate};

use modkit::RouteTable;

pub const HABITS_SCOPE: &str = "habits";
pub const TAGS_SCOPE: &str = "tags";

pub mod action {
    pub const GET: &str = "get";
    pub const LIST: &str = "list";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const PATCH: &str = "patch";
    pub const DELETE: &str = "delete";
    pub const UPSERT_TAGS: &str = "upsert-tags";
}

pub const UPSERT_TAGS_REL: &str = "upsert-tags";

pub static HABIT_LINKS: Lazy<LinkCatalog> = Lazy::new(|| LinkCatalog {
    scope: Some(HABITS_SCOPE),
    id_param: "id",
    resource: vec![
        LinkTemplate::new(action::GET, rel::SELF, method::GET).echo_fields(),
        LinkTemplate::new(action::UPDATE, rel::UPDATE, method::PUT),
        LinkTemplate::new(action::PATCH, rel::PARTIAL_UPDATE, method::PATCH),
        LinkTemplate::new(action::DELETE, rel::DELETE, method::DELETE),
        LinkTemplate::new(action::UPSERT_TAGS, UPSERT_TAGS_REL, method::PUT),
    ],
    list_action: action::LIST,
    create_action: Some(action::CREATE),
});

pub static TAG_LINKS: Lazy<LinkCatalog> = Lazy::new(|| LinkCatalog {
    scope: Some(TAGS_SCOPE),
    id_param: "id",
    resource: vec![
        LinkTemplate::new(action::GET, rel::SELF, method::GET).echo_fields(),
        LinkTemplate::new(action::UPDATE, rel::UPDATE, method::PUT),
        LinkTemplate::new(action::DELETE, rel::DELETE, method::DELETE),
    ],
    list_action: action::LIST,
    create_action: Some(action::CREATE),
});

/// Named routes of this module, mirroring the paths registered in `routes`.
pub fn route_table(base_url: Option<&str>) -> RouteTable {
    RouteTable::new()
        .with_base_url(base_url)
        .route(Some(HABITS_SCOPE), action::LIST, "/habits")
        .route(Some(HABITS_SCOPE), action::CREATE, "/habits")
        .route(Some(HABITS_SCOPE), action::GET, "/habits/{id}")
        .route(Some(HABITS_SCOPE), action::UPDATE, "/habits/{id}")
        .route(Some(HABITS_SCOPE), action::PATCH, "/habits/{id}")
        .route(Some(HABITS_SCOPE), action::DELETE, "/habits/{id}")
        .route(Some(HABITS_SCOPE), action::UPSERT_TAGS, "/habits/{id}/tags")
        .route(Some(TAGS_SCOPE), action::LIST, "/tags")
        .route(Some(TAGS_SCOPE), action::CREATE, "/tags")
        .route(Some(TAGS_SCOPE), action::GET, "/tags/{id}")
        .route(Some(TAGS_SCOPE), action::UPDATE, "/tags/{id}")
        .route(Some(TAGS_SCOPE), action::DELETE, "/tags/{id}")
}
