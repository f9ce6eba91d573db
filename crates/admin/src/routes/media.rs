//! Product image upload, removal and ordering.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State, multipart::Field},
    http::StatusCode,
    routing::{delete, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use tidewear_core::db::ProductRepository;
use tidewear_core::db::products::ProductMedia;
use tidewear_core::{MediaId, ProductId, ProductRef};

use crate::db::MediaRepository;
use crate::db::media::is_complete_order;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::media::MediaError;
use crate::state::AppState;

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Build the media router (mounted at `/api`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/{id}/media", post(upload))
        .route("/products/{id}/media/order", put(reorder))
        .route("/media/{id}", delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<MediaId>,
}

/// Store an uploaded image and append it to the product's gallery.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProductMedia>)> {
    ProductRepository::new(state.pool())
        .find(&ProductRef::Id(id), true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            // Reject the type before reading the body.
            state.media().validate(&content_type, 1)?;
            let bytes = read_limited(field, state.media().max_bytes()).await?;
            upload = Some((content_type, bytes));
            break;
        }
    }
    let (content_type, bytes) = upload
        .ok_or_else(|| AppError::BadRequest(format!("missing multipart field `{FILE_FIELD}`")))?;

    let stored = state.media().save(id, &content_type, &bytes).await?;
    let record = MediaRepository::new(state.pool())
        .insert(id, &stored.url, &stored.file_name, &stored.content_type)
        .await;

    match record {
        Ok(media) => Ok((StatusCode::CREATED, Json(media))),
        Err(e) => {
            // Don't leave an orphaned file behind.
            if let Err(cleanup) = state.media().delete(&stored.file_name).await {
                tracing::warn!(
                    error = %cleanup,
                    file = %stored.file_name,
                    "Could not remove orphaned upload"
                );
            }
            Err(e.into())
        }
    }
}

/// Remove an image record and its file.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<MediaId>,
) -> Result<StatusCode> {
    let media = MediaRepository::new(state.pool()).delete(id).await?;
    state.media().delete(&media.file_name).await?;
    tracing::info!(media_id = %id, product_id = %media.product_id, "Product media removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Set the display order; `ids` must list every image of the product once.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id))]
pub async fn reorder(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<ProductMedia>>> {
    let products = ProductRepository::new(state.pool());
    products
        .find(&ProductRef::Id(id), true)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let existing: Vec<MediaId> = products.media(id).await?.iter().map(|m| m.id).collect();
    if !is_complete_order(&existing, &body.ids) {
        return Err(AppError::BadRequest(
            "ids must list every image of the product exactly once".to_owned(),
        ));
    }

    MediaRepository::new(state.pool())
        .reorder(id, &body.ids)
        .await?;
    Ok(Json(products.media(id).await?))
}

/// Read a multipart field, failing as soon as it grows past `max` bytes.
async fn read_limited(mut field: Field<'_>, max: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > max {
            return Err(MediaError::TooLarge { max }.into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
