//! Checkout and order confirmation.
//!
//! A failed checkout leaves the session untouched: the cart is only replaced
//! after the order snapshot has been written.

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use bikeshop_core::checkout::{self, CheckoutError, CheckoutForm, FieldError, OrderSnapshot};

use crate::error::{Result, add_breadcrumb};
use crate::models::session_keys;
use crate::routes::cart::{CartItemView, CartView};
use crate::services::cart;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutErrors {
    pub errors: Vec<FieldError>,
    pub form: CheckoutForm,
    pub items: Vec<CartItemView>,
    pub total: String,
}

/// `GET /checkout`. An empty cart goes back to the catalog.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let ledger = cart::load_ledger(&session).await?;
    let summary = cart::resolve(state.pool(), &ledger).await?;
    if summary.is_empty() {
        return Ok(Redirect::to("/").into_response());
    }

    let view = CartView::new(&summary, &ledger, state.media_url());
    Ok(Json(json!({ "items": view.items, "total": view.total })).into_response())
}

/// `POST /checkout`
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let ledger = cart::load_ledger(&session).await?;
    let summary = cart::resolve(state.pool(), &ledger).await?;

    match checkout::finalize_summary(&summary, &form) {
        Ok(completed) => {
            session
                .insert(session_keys::LAST_ORDER, &completed.order)
                .await?;
            cart::store_ledger(&session, &completed.cart).await?;

            add_breadcrumb("checkout", "Order placed", None);
            tracing::info!(
                total = %completed.order.total,
                item_count = completed.order.item_count,
                "checkout completed"
            );
            Ok(Redirect::to("/success").into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/").into_response()),
        Err(CheckoutError::Invalid(errors)) => {
            let view = CartView::new(&summary, &ledger, state.media_url());
            let body = CheckoutErrors {
                errors,
                form,
                items: view.items,
                total: view.total,
            };
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

/// `GET /success`. The snapshot is shown once and then dropped.
#[instrument(skip(session))]
pub async fn success(session: Session) -> Result<Json<serde_json::Value>> {
    let order = session
        .remove_value(session_keys::LAST_ORDER)
        .await?
        .and_then(|raw| match serde_json::from_value::<OrderSnapshot>(raw) {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed order snapshot");
                None
            }
        });
    Ok(Json(json!({ "order": order })))
}
