//! Sales order handlers
//!
//! One path, four verbs. GET and DELETE take the sales order id from the
//! query string, PUT and POST from a JSON body. Every response carries a
//! boolean `success`, except a successful GET which returns the record itself.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderMap,
    Extension, Json,
};
use tracing::{info, instrument};

use domain_sales_order::RecordRepresentation;

use super::operation_metadata;
use crate::auth::{permissions, require_role, Claims};
use crate::dto::sales_order::*;
use crate::{error::ApiError, AppState};

/// Reads a sales order
#[instrument(skip_all)]
pub async fn get_sales_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    params: Result<Query<GetSalesOrderParams>, QueryRejection>,
) -> Result<Json<RecordRepresentation>, ApiError> {
    require_role(&claims, permissions::SALES_ORDER_READ)?;
    let Query(params) = params?;

    let record = state
        .service
        .read(params.so_id_postman, Some(operation_metadata(&headers, &claims)))
        .await?;

    Ok(Json(record))
}

/// Re-assigns a sales order to another customer
#[instrument(skip_all)]
pub async fn update_sales_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Result<Json<UpdateSalesOrderRequest>, JsonRejection>,
) -> Result<Json<UpdateSalesOrderResponse>, ApiError> {
    require_role(&claims, permissions::SALES_ORDER_WRITE)?;
    let Json(request) = body?;

    let updated_so_id = state
        .service
        .update(request.into(), Some(operation_metadata(&headers, &claims)))
        .await?;

    info!(%updated_so_id, user = %claims.sub, "Sales order updated");
    Ok(Json(UpdateSalesOrderResponse {
        success: true,
        updated_so_id,
    }))
}

/// Creates a sales order with one item line per requested item
#[instrument(skip_all)]
pub async fn create_sales_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Result<Json<CreateSalesOrderRequest>, JsonRejection>,
) -> Result<Json<CreateSalesOrderResponse>, ApiError> {
    require_role(&claims, permissions::SALES_ORDER_WRITE)?;
    let Json(request) = body?;

    let sales_order_id = state
        .service
        .create(request.into(), Some(operation_metadata(&headers, &claims)))
        .await?;

    info!(%sales_order_id, user = %claims.sub, "Sales order created");
    Ok(Json(CreateSalesOrderResponse {
        success: true,
        sales_order_id,
    }))
}

/// Deletes a sales order
#[instrument(skip_all)]
pub async fn delete_sales_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    params: Result<Query<DeleteSalesOrderParams>, QueryRejection>,
) -> Result<Json<DeleteSalesOrderResponse>, ApiError> {
    require_role(&claims, permissions::SALES_ORDER_WRITE)?;
    let Query(params) = params?;

    let deleted_so_id = state
        .service
        .delete(params.so_id_to_dlt, Some(operation_metadata(&headers, &claims)))
        .await?;

    info!(%deleted_so_id, user = %claims.sub, "Sales order deleted");
    Ok(Json(DeleteSalesOrderResponse {
        success: true,
        deleted_so_id,
    }))
}
