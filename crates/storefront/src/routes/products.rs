//! Staff actions on catalog products.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tracing::instrument;

use bikeshop_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::services::uploader;
use crate::state::AppState;

/// `POST /products/{id}/delete`. Removes the row and its stored image.
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    if !uploader::delete_product(state.pool(), state.media(), id).await? {
        return Err(AppError::NotFound(format!("Product {id}")));
    }
    Ok(Redirect::to("/"))
}
