//! Request and response DTOs

pub mod sales_order;
