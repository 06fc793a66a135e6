//! Sales order DTOs
//!
//! Field names match what existing clients already send, including the
//! query parameter names on GET and DELETE.

use serde::{Deserialize, Serialize};

use core_kernel::{EntityId, ItemId, SalesOrderId};
use domain_sales_order::{NewSalesOrder, SalesOrderEntityUpdate};

/// Query string for GET
#[derive(Debug, Deserialize)]
pub struct GetSalesOrderParams {
    pub so_id_postman: SalesOrderId,
}

/// Body for PUT
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateSalesOrderRequest {
    pub sales_order_id: SalesOrderId,
    pub entity: EntityId,
}

impl From<UpdateSalesOrderRequest> for SalesOrderEntityUpdate {
    fn from(request: UpdateSalesOrderRequest) -> Self {
        SalesOrderEntityUpdate {
            sales_order_id: request.sales_order_id,
            entity: request.entity,
        }
    }
}

/// Body for POST
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateSalesOrderRequest {
    pub entity: EntityId,
    pub items: Vec<ItemLine>,
}

/// One requested item line
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ItemLine {
    pub itemid: ItemId,
}

impl From<CreateSalesOrderRequest> for NewSalesOrder {
    fn from(request: CreateSalesOrderRequest) -> Self {
        NewSalesOrder {
            entity: request.entity,
            items: request.items.into_iter().map(|line| line.itemid).collect(),
        }
    }
}

/// Query string for DELETE
#[derive(Debug, Deserialize)]
pub struct DeleteSalesOrderParams {
    pub so_id_to_dlt: SalesOrderId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSalesOrderResponse {
    pub success: bool,
    pub updated_so_id: SalesOrderId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSalesOrderResponse {
    pub success: bool,
    pub sales_order_id: SalesOrderId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteSalesOrderResponse {
    pub success: bool,
    pub deleted_so_id: SalesOrderId,
}
