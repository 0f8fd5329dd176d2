//! Generic REST handlers and the route table
//!
//! Every handler is generic over the [`Entity`] it serves, so the four
//! collections share one implementation. Relation and owner routes carry
//! their relation name as a request extension.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};

use super::error::{ApiError, ApiOperation};
use super::query::ListQuery;
use crate::health;
use crate::models::{Actor, Director, Movie, Review};
use crate::repository::{Entity, EntityRef};
use crate::responses::{Created, MetadataDto, NoContent};
use crate::state::AppState;

type QueryPairs = Query<Vec<(String, String)>>;

/// Name of a parent's child collection, e.g. `movies`
#[derive(Debug, Clone, Copy)]
struct RelationName(&'static str);

/// Name of a foreign-key owner, e.g. `actor`
#[derive(Debug, Clone, Copy)]
struct OwnerRelation(&'static str);

/// The full REST surface plus health probes
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .merge(entity_routes::<Actor>())
        .merge(entity_routes::<Director>())
        .merge(entity_routes::<Movie>())
        .merge(entity_routes::<Review>())
        .merge(relation_routes::<Actor, Movie>("movies"))
        .merge(relation_routes::<Director, Movie>("movies"))
        .merge(relation_routes::<Movie, Review>("reviews"))
        .merge(owner_routes::<Movie, Actor>("actor"))
        .merge(owner_routes::<Movie, Director>("director"))
        .merge(owner_routes::<Review, Movie>("movie"))
        .with_state(state)
}

/// CRUD, list and count under `/api/{collection}`
pub fn entity_routes<E: Entity>() -> Router<AppState> {
    let collection = format!("/api/{}", E::COLLECTION);
    let meta = format!("{collection}/meta");
    let item = format!("{collection}/{{id}}");

    Router::new()
        .route(&collection, get(list::<E>).post(create::<E>))
        .route(&meta, post(count::<E>))
        .route(
            &item,
            get(get_one::<E>).patch(update::<E>).delete(delete::<E>),
        )
}

/// Connect, disconnect, replace and list under `/api/{parent}/{id}/{name}`
pub fn relation_routes<P: Entity, C: Entity>(name: &'static str) -> Router<AppState> {
    let path = format!("/api/{}/{{id}}/{}", P::COLLECTION, name);

    Router::new()
        .route(
            &path,
            get(list_related::<P, C>)
                .post(connect::<P, C>)
                .delete(disconnect::<P, C>)
                .patch(replace::<P, C>),
        )
        .layer(Extension(RelationName(name)))
}

/// Owner lookup under `/api/{collection}/{id}/{relation}`
pub fn owner_routes<E: Entity, O: Entity>(relation: &'static str) -> Router<AppState> {
    let path = format!("/api/{}/{{id}}/{}", E::COLLECTION, relation);

    Router::new()
        .route(&path, get(get_owner::<E, O>))
        .layer(Extension(OwnerRelation(relation)))
}

/// Path of one entity, with the id encoded as a single segment
fn location<E: Entity>(id: &str) -> String {
    format!("/api/{}/{}", E::COLLECTION, urlencoding::encode(id))
}

fn child_ids(refs: Vec<EntityRef>) -> Vec<String> {
    refs.into_iter().map(|r| r.id).collect()
}

async fn list<E: Entity>(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<Vec<E>>, ApiError> {
    let args = ListQuery::from_pairs(pairs, ApiOperation::List)?
        .into_args::<E>(ApiOperation::List, state.config().api.max_take)?;
    let entities = state.repository::<E>().find_many(&args).await?;
    Ok(Json(entities))
}

async fn count<E: Entity>(
    State(state): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<MetadataDto, ApiError> {
    let filter = ListQuery::from_pairs(pairs, ApiOperation::Count)?
        .filter::<E>(ApiOperation::Count)?;
    let count = state.repository::<E>().count(&filter).await?;
    Ok(MetadataDto::new(count))
}

async fn get_one<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<E>, ApiError> {
    let entity = state.repository::<E>().find_one(&id).await?;
    Ok(Json(entity))
}

async fn create<E: Entity>(
    State(state): State<AppState>,
    Json(input): Json<E::Create>,
) -> Result<Created<E>, ApiError> {
    let entity = state.repository::<E>().create(input).await?;
    let location = location::<E>(entity.id());
    Ok(Created::new(entity).with_location(location))
}

async fn update<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<E::Update>,
) -> Result<NoContent, ApiError> {
    state.repository::<E>().update(&id, input).await?;
    Ok(NoContent)
}

async fn delete<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state.repository::<E>().delete(&id).await?;
    Ok(NoContent)
}

async fn list_related<P: Entity, C: Entity>(
    State(state): State<AppState>,
    Extension(RelationName(name)): Extension<RelationName>,
    Path(id): Path<String>,
    Query(pairs): QueryPairs,
) -> Result<Json<Vec<C>>, ApiError> {
    let args = ListQuery::from_pairs(pairs, ApiOperation::ListRelated)?
        .into_args::<C>(ApiOperation::ListRelated, state.config().api.max_take)?;
    let children = state
        .relationship::<P, C>(name)?
        .find_related(&id, &args)
        .await?;
    Ok(Json(children))
}

async fn connect<P: Entity, C: Entity>(
    State(state): State<AppState>,
    Extension(RelationName(name)): Extension<RelationName>,
    Path(id): Path<String>,
    Json(refs): Json<Vec<EntityRef>>,
) -> Result<NoContent, ApiError> {
    state
        .relationship::<P, C>(name)?
        .connect(&id, &child_ids(refs))
        .await?;
    Ok(NoContent)
}

async fn disconnect<P: Entity, C: Entity>(
    State(state): State<AppState>,
    Extension(RelationName(name)): Extension<RelationName>,
    Path(id): Path<String>,
    Json(refs): Json<Vec<EntityRef>>,
) -> Result<NoContent, ApiError> {
    state
        .relationship::<P, C>(name)?
        .disconnect(&id, &child_ids(refs))
        .await?;
    Ok(NoContent)
}

async fn replace<P: Entity, C: Entity>(
    State(state): State<AppState>,
    Extension(RelationName(name)): Extension<RelationName>,
    Path(id): Path<String>,
    Json(refs): Json<Vec<EntityRef>>,
) -> Result<NoContent, ApiError> {
    state
        .relationship::<P, C>(name)?
        .replace(&id, &child_ids(refs))
        .await?;
    Ok(NoContent)
}

async fn get_owner<E: Entity, O: Entity>(
    State(state): State<AppState>,
    Extension(OwnerRelation(relation)): Extension<OwnerRelation>,
    Path(id): Path<String>,
) -> Result<Json<O>, ApiError> {
    let owner = state.repository::<E>().find_owner::<O>(&id, relation).await?;
    Ok(Json(owner))
}
