//! Generic CRUD handlers, instantiated once per [`Resource`].
//!
//! Routing is derived from the resource's [`Schema`]: admin-only operations get
//! the `require_admin` layer, denied operations are simply not routed.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State, rejection::PathRejection},
    http::StatusCode,
    middleware,
    routing::{MethodRouter, delete, get, post, put},
};
use axum_extra::extract::WithRejection;
use chrono::{SubsecRound, Utc};
use tracing::info;
use uuid::Uuid;

use folio_db::{DocumentRow, ListOrder};
use folio_types::api::MessageResponse;
use folio_types::models::Document;
use folio_types::resource::{Access, Resource, Schema};

use crate::error::ApiError;
use crate::middleware::require_admin;
use crate::state::{AppState, run_db};
use crate::upload::{UPLOAD_BODY_LIMIT, upload_image};

pub fn routes<R: Resource>(state: &AppState) -> Router<AppState> {
    let schema: Schema = R::SCHEMA;

    let collection = gated(get(list::<R>), schema.list, state)
        .merge(gated(post(create::<R>), schema.create, state));

    let item = gated(get(get_one::<R>), schema.get, state)
        .merge(gated(put(update::<R>), schema.update, state))
        .merge(gated(delete(remove::<R>), schema.delete, state));

    let mut router = Router::new()
        .route(&format!("/{}", schema.route), collection)
        .route(&format!("/{}/{{id}}", schema.route), item);

    if schema.upload.is_routed() {
        let upload = post(upload_image::<R>).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));
        router = router.route(
            &format!("/{}/upload", schema.route),
            gated(upload, schema.upload, state),
        );
    }

    router
}

fn gated(route: MethodRouter<AppState>, access: Access, state: &AppState) -> MethodRouter<AppState> {
    match access {
        Access::Public => route,
        Access::Admin => route.route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        Access::Denied => MethodRouter::new(),
    }
}

/// Client ids must be UUIDs; anything else is a 400, never a 404.
fn parse_id<R: Resource>(raw: &str) -> Result<String, ApiError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::InvalidIdFormat(R::SCHEMA.label))
}

/// A path segment that is not valid UTF-8 never reaches `parse_id`; report it
/// the same way.
fn path_id<R: Resource>(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::InvalidIdFormat(R::SCHEMA.label))?;
    parse_id::<R>(&raw)
}

fn to_document<R: Resource>(row: DocumentRow) -> Result<Document<R>, ApiError> {
    let fields = match serde_json::from_str::<R>(&row.body) {
        Ok(fields) => fields,
        Err(e) => {
            return Err(ApiError::Internal(format!(
                "corrupt {} document {}: {}",
                R::SCHEMA.collection,
                row.id,
                e
            )));
        }
    };

    Ok(Document {
        id: row.id,
        fields,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn encode<R: Resource>(fields: &R) -> Result<String, ApiError> {
    serde_json::to_string(fields).map_err(|e| ApiError::Internal(format!("encode document: {}", e)))
}

async fn list<R: Resource>(State(state): State<AppState>) -> Result<Json<Vec<Document<R>>>, ApiError> {
    let schema = R::SCHEMA;
    let order = if schema.newest_first() {
        ListOrder::NewestFirst
    } else {
        ListOrder::Unordered
    };

    let rows = run_db(&state, move |db| db.list_documents(schema.collection, order)).await?;
    let documents = rows
        .into_iter()
        .map(to_document::<R>)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(documents))
}

async fn get_one<R: Resource>(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Document<R>>, ApiError> {
    let schema = R::SCHEMA;
    let id = path_id::<R>(path)?;

    let row = run_db(&state, move |db| db.get_document(schema.collection, &id))
        .await?
        .ok_or(ApiError::NotFound(schema.label))?;

    Ok(Json(to_document(row)?))
}

async fn create<R: Resource>(
    State(state): State<AppState>,
    WithRejection(Json(fields), _): WithRejection<Json<R>, ApiError>,
) -> Result<(StatusCode, Json<Document<R>>), ApiError> {
    let schema = R::SCHEMA;
    fields.validate().map_err(ApiError::Validation)?;

    // Stored timestamps carry microseconds; answer with what a later read returns.
    let now = Utc::now().trunc_subsecs(6);
    let created_at = schema.timestamps.tracks_created().then_some(now);
    let updated_at = schema.timestamps.tracks_updated().then_some(now);
    let body = encode(&fields)?;

    let id = run_db(&state, move |db| {
        db.insert_document(schema.collection, &body, created_at, updated_at)
    })
    .await?;

    info!(collection = schema.collection, %id, "Document created");
    Ok((
        StatusCode::CREATED,
        Json(Document {
            id,
            fields,
            created_at,
            updated_at,
        }),
    ))
}

/// Full replace: every resource field takes the payload's value.
async fn update<R: Resource>(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    WithRejection(Json(fields), _): WithRejection<Json<R>, ApiError>,
) -> Result<Json<Document<R>>, ApiError> {
    let schema = R::SCHEMA;
    let id = path_id::<R>(path)?;
    fields.validate().map_err(ApiError::Validation)?;

    let updated_at = schema.timestamps.tracks_updated().then(Utc::now);
    let body = encode(&fields)?;

    let row = run_db(&state, move |db| {
        if !db.replace_document(schema.collection, &id, &body, updated_at)? {
            return Ok(None);
        }
        db.get_document(schema.collection, &id)
    })
    .await?
    .ok_or(ApiError::NotFound(schema.label))?;

    info!(collection = schema.collection, id = %row.id, "Document updated");
    Ok(Json(to_document(row)?))
}

async fn remove<R: Resource>(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let schema = R::SCHEMA;
    let id = path_id::<R>(path)?;

    let log_id = id.clone();
    let deleted = run_db(&state, move |db| db.delete_document(schema.collection, &id)).await?;
    if !deleted {
        return Err(ApiError::NotFound(schema.label));
    }

    info!(collection = schema.collection, id = %log_id, "Document deleted");
    Ok(Json(MessageResponse::new(format!(
        "{} deleted successfully",
        schema.label
    ))))
}
