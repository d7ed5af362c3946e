//! Cart route handlers.
//!
//! AJAX callers (`X-Requested-With: XMLHttpRequest`) get JSON back from the
//! mutating endpoints; everyone else is redirected to `/cart`.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use bikeshop_core::ProductId;
use bikeshop_core::cart::{CartCommand, CartLedger, CartSummary};
use bikeshop_core::types::price::format_amount;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::catalog::ProductView;
use crate::services::cart;
use crate::state::AppState;

/// Quantity field; missing means 1.
#[derive(Debug, Default, Deserialize)]
pub struct QuantityForm {
    pub qty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub product: ProductView,
    pub quantity: u32,
    pub subtotal: String,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub count: u64,
}

impl CartView {
    #[must_use]
    pub fn new(summary: &CartSummary, ledger: &CartLedger, media_url: &str) -> Self {
        Self {
            items: summary
                .lines
                .iter()
                .map(|line| CartItemView {
                    product: ProductView::new(&line.product, media_url),
                    quantity: line.quantity,
                    subtotal: format_amount(line.subtotal),
                })
                .collect(),
            total: format_amount(summary.total),
            count: ledger.total_quantity(),
        }
    }
}

pub(crate) fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"XMLHttpRequest"))
}

async fn apply(session: &Session, command: CartCommand) -> Result<CartLedger> {
    let ledger = cart::load_ledger(session).await?.apply(command);
    cart::store_ledger(session, &ledger).await?;
    Ok(ledger)
}

/// `GET /cart`
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let ledger = cart::load_ledger(&session).await?;
    let summary = cart::resolve(state.pool(), &ledger).await?;
    Ok(Json(CartView::new(&summary, &ledger, state.media_url())))
}

/// `GET /cart/count`
pub async fn count(session: Session) -> Result<Json<serde_json::Value>> {
    let ledger = cart::load_ledger(&session).await?;
    Ok(Json(json!({ "count": ledger.total_quantity() })))
}

/// `POST /cart/add/{product_id}`
///
/// The product is not looked up here; an id that does not exist simply never
/// resolves when the cart is shown.
#[instrument(skip(session, headers, form))]
pub async fn add(
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let command = CartCommand::add(product_id, form.qty.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let ledger = apply(&session, command).await?;

    let id = product_id.to_string();
    add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));

    if is_ajax(&headers) {
        return Ok(Json(json!({ "ok": true, "count": ledger.total_quantity() })).into_response());
    }
    Ok(Redirect::to("/cart").into_response())
}

/// `POST /cart/update/{product_id}`. Zero or less removes the line.
#[instrument(skip(state, session, headers, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Response> {
    let command = CartCommand::set_quantity(product_id, form.qty.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let ledger = apply(&session, command).await?;

    if !is_ajax(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    let summary = cart::resolve(state.pool(), &ledger).await?;
    let item_subtotal = summary
        .subtotal_for(product_id)
        .map_or_else(|| "0.00".to_string(), format_amount);
    Ok(Json(json!({
        "ok": true,
        "total": format_amount(summary.total),
        "item_subtotal": item_subtotal,
        "count": ledger.total_quantity(),
    }))
    .into_response())
}

/// `POST /cart/remove/{product_id}`. Removing an absent line is not an error.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
) -> Result<Response> {
    let ledger = apply(&session, CartCommand::remove(product_id)).await?;

    if !is_ajax(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    let summary = cart::resolve(state.pool(), &ledger).await?;
    Ok(Json(json!({
        "ok": true,
        "total": format_amount(summary.total),
        "count": ledger.total_quantity(),
    }))
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_ajax() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax(&headers));
        headers.insert("x-requested-with", HeaderValue::from_static("fetch"));
        assert!(!is_ajax(&headers));
    }
}
