use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tracing::{debug, info};

use modkit::api::query::{FIELDS, SORT};
use modkit::api::ShapeQuery;
use modkit::{CollectionQuery, ProblemResponse, Representation, RouteTable};
use query_core::shaping::{self, ShapedRecord};
use query_core::{LinkDto, LinkSynthesizer, QueryParams, Shape, SortMappingRegistry};

use crate::api::rest::dto::{
    CreateHabitReq, CreateTagReq, HabitDto, HabitFilterParams, HabitWithTagsDto, PatchHabitReq,
    TagDto, TagsCollectionDto, UpdateHabitReq, UpdateTagReq, UpsertHabitTagsReq,
};
use crate::api::rest::error::{body_problem, problem, HabitsResult};
use crate::api::rest::links::{HABIT_LINKS, TAG_LINKS};
use crate::api::rest::sorting::DEFAULT_SORT_KEY;
use crate::contract::model::{Habit, Tag};
use crate::domain::service::Service;

/// Shared, read-only state of the REST layer.
pub struct RestState {
    pub service: Arc<Service>,
    pub sorts: SortMappingRegistry,
    pub routes: RouteTable,
}

impl RestState {
    fn habit_links(&self) -> LinkSynthesizer<'_> {
        LinkSynthesizer::new(&self.routes, &HABIT_LINKS)
    }

    fn tag_links(&self) -> LinkSynthesizer<'_> {
        LinkSynthesizer::new(&self.routes, &TAG_LINKS)
    }
}

type HandlerResult = Result<Response, ProblemResponse>;

fn json_body<T>(payload: Result<Json<T>, JsonRejection>, uri: &Uri) -> Result<T, ProblemResponse> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| body_problem(rejection, uri.path()))
}

/// Shape one record; its links go in only for the hypermedia representation.
fn shape_with_links<T: Shape>(
    record: &T,
    fields: Option<&str>,
    links: Vec<LinkDto>,
    repr: &Representation,
) -> HabitsResult<ShapedRecord> {
    let mut shaped = shaping::shape_one(record, fields)?;
    if repr.include_links() {
        shaping::attach_links(&mut shaped, links)?;
    }
    Ok(shaped)
}

fn created(repr: &Representation, body: &ShapedRecord, links: &[LinkDto]) -> Response {
    let mut resp = repr.respond(StatusCode::CREATED, body);
    let location = links
        .first()
        .and_then(|self_link| HeaderValue::from_str(&self_link.href).ok());
    if let Some(location) = location {
        resp.headers_mut().insert(header::LOCATION, location);
    }
    resp
}

// ---- habits ----

/// GET /habits
pub async fn list_habits(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    repr: Representation,
    query: CollectionQuery,
    Query(filters): Query<HabitFilterParams>,
) -> HandlerResult {
    list_habits_impl(&state, &repr, &query, &filters)
        .await
        .map_err(problem(uri.path()))
}

async fn list_habits_impl(
    state: &RestState,
    repr: &Representation,
    query: &CollectionQuery,
    filters: &HabitFilterParams,
) -> HabitsResult<Response> {
    state.sorts.validate::<HabitDto, Habit>(query.sort())?;
    shaping::validate_fields::<HabitDto>(query.fields())?;
    let filter = filters.to_filter()?;
    let order = state
        .sorts
        .build::<HabitDto, Habit>(query.sort(), DEFAULT_SORT_KEY)?;

    let page = state
        .service
        .list_habits_page(&filter, &order, query.page_request())
        .await?
        .map_items(HabitDto::from);

    let synth = state.habit_links();
    let collection_links = synth.collection_links(
        &query.link_params(filters.link_filters()),
        page.has_next_page(),
        page.has_previous_page(),
    )?;

    let fields = query.fields();
    let page = page.try_map_items(|items| {
        if repr.include_links() {
            shaping::shape_many_with_links(&items, fields, |h, f| {
                synth.resource_links(&h.identity(), f)
            })
        } else {
            shaping::shape_many(&items, fields)
        }
    })?;
    let page = if repr.include_links() {
        page.with_links(collection_links)
    } else {
        page
    };

    debug!(
        total = page.total_count(),
        page = page.page(),
        "listed habits"
    );
    Ok(repr.respond(StatusCode::OK, &page))
}

/// GET /habits/{id}
pub async fn get_habit(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    repr: Representation,
    Path(id): Path<String>,
    shape: ShapeQuery,
) -> HandlerResult {
    get_habit_impl(&state, &repr, &id, shape.fields())
        .await
        .map_err(problem(uri.path()))
}

async fn get_habit_impl(
    state: &RestState,
    repr: &Representation,
    id: &str,
    fields: Option<&str>,
) -> HabitsResult<Response> {
    shaping::validate_fields::<HabitWithTagsDto>(fields)?;
    let habit = HabitWithTagsDto::from(state.service.get_habit_with_tags(id).await?);
    let links = state.habit_links().resource_links(&habit.identity(), fields)?;
    let body = shape_with_links(&habit, fields, links, repr)?;
    Ok(repr.respond(StatusCode::OK, &body))
}

/// POST /habits
pub async fn create_habit(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    repr: Representation,
    payload: Result<Json<CreateHabitReq>, JsonRejection>,
) -> HandlerResult {
    let req = json_body(payload, &uri)?;
    info!(name = %req.name, "creating habit");
    create_habit_impl(&state, &repr, req)
        .await
        .map_err(problem(uri.path()))
}

async fn create_habit_impl(
    state: &RestState,
    repr: &Representation,
    req: CreateHabitReq,
) -> HabitsResult<Response> {
    let habit = HabitDto::from(state.service.create_habit(req.into()).await?);
    let links = state.habit_links().resource_links(&habit.identity(), None)?;
    let body = shape_with_links(&habit, None, links.clone(), repr)?;
    Ok(created(repr, &body, &links))
}

/// PUT /habits/{id}
pub async fn update_habit(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<String>,
    payload: Result<Json<UpdateHabitReq>, JsonRejection>,
) -> HandlerResult {
    let req = json_body(payload, &uri)?;
    state
        .service
        .update_habit(&id, req.into())
        .await
        .map_err(|e| problem(uri.path())(e.into()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// PATCH /habits/{id}
pub async fn patch_habit(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<String>,
    payload: Result<Json<PatchHabitReq>, JsonRejection>,
) -> HandlerResult {
    let req = json_body(payload, &uri)?;
    state
        .service
        .patch_habit(&id, req.into())
        .await
        .map_err(|e| problem(uri.path())(e.into()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /habits/{id}
pub async fn delete_habit(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<String>,
) -> HandlerResult {
    state
        .service
        .delete_habit(&id)
        .await
        .map_err(|e| problem(uri.path())(e.into()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// PUT /habits/{id}/tags
pub async fn upsert_habit_tags(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<String>,
    payload: Result<Json<UpsertHabitTagsReq>, JsonRejection>,
) -> HandlerResult {
    let req = json_body(payload, &uri)?;
    state
        .service
        .upsert_habit_tags(&id, req.tag_ids)
        .await
        .map_err(|e| problem(uri.path())(e.into()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---- tags ----

/// GET /tags
pub async fn list_tags(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    repr: Representation,
    query: CollectionQuery,
) -> HandlerResult {
    list_tags_impl(&state, &repr, &query)
        .await
        .map_err(problem(uri.path()))
}

async fn list_tags_impl(
    state: &RestState,
    repr: &Representation,
    query: &CollectionQuery,
) -> HabitsResult<Response> {
    state.sorts.validate::<TagDto, Tag>(query.sort())?;
    shaping::validate_fields::<TagDto>(query.fields())?;
    let order = state
        .sorts
        .build::<TagDto, Tag>(query.sort(), DEFAULT_SORT_KEY)?;

    let tags: Vec<TagDto> = state
        .service
        .list_tags(&order)
        .await?
        .into_iter()
        .map(TagDto::from)
        .collect();

    let synth = state.tag_links();
    let params = QueryParams::new()
        .with_opt(SORT, query.sort())
        .with_opt(FIELDS, query.fields());
    let links = synth.collection_links(&params, false, false)?;

    let fields = query.fields();
    let body = if repr.include_links() {
        TagsCollectionDto {
            data: shaping::shape_many_with_links(&tags, fields, |t, f| {
                synth.resource_links(&t.identity(), f)
            })?,
            links,
        }
    } else {
        TagsCollectionDto {
            data: shaping::shape_many(&tags, fields)?,
            links: Vec::new(),
        }
    };
    Ok(repr.respond(StatusCode::OK, &body))
}

/// GET /tags/{id}
pub async fn get_tag(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    repr: Representation,
    Path(id): Path<String>,
    shape: ShapeQuery,
) -> HandlerResult {
    get_tag_impl(&state, &repr, &id, shape.fields())
        .await
        .map_err(problem(uri.path()))
}

async fn get_tag_impl(
    state: &RestState,
    repr: &Representation,
    id: &str,
    fields: Option<&str>,
) -> HabitsResult<Response> {
    shaping::validate_fields::<TagDto>(fields)?;
    let tag = TagDto::from(state.service.get_tag(id).await?);
    let links = state.tag_links().resource_links(&tag.identity(), fields)?;
    let body = shape_with_links(&tag, fields, links, repr)?;
    Ok(repr.respond(StatusCode::OK, &body))
}

/// POST /tags
pub async fn create_tag(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    repr: Representation,
    payload: Result<Json<CreateTagReq>, JsonRejection>,
) -> HandlerResult {
    let req = json_body(payload, &uri)?;
    info!(name = %req.name, "creating tag");
    create_tag_impl(&state, &repr, req)
        .await
        .map_err(problem(uri.path()))
}

async fn create_tag_impl(
    state: &RestState,
    repr: &Representation,
    req: CreateTagReq,
) -> HabitsResult<Response> {
    let tag = TagDto::from(state.service.create_tag(req.into()).await?);
    let links = state.tag_links().resource_links(&tag.identity(), None)?;
    let body = shape_with_links(&tag, None, links.clone(), repr)?;
    Ok(created(repr, &body, &links))
}

/// PUT /tags/{id}
pub async fn update_tag(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTagReq>, JsonRejection>,
) -> HandlerResult {
    let req = json_body(payload, &uri)?;
    state
        .service
        .update_tag(&id, req.into())
        .await
        .map_err(|e| problem(uri.path())(e.into()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /tags/{id}
pub async fn delete_tag(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<String>,
) -> HandlerResult {
    state
        .service
        .delete_tag(&id)
        .await
        .map_err(|e| problem(uri.path())(e.into()))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
