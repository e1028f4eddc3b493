//! Customers: the model, database queries, and route handlers.

pub mod core;
mod endpoints;

pub use core::{Customer, create_customer, create_customer_table, get_customer, search_customers};
pub use endpoints::{
    CustomerForm, CustomerResponse, create_customer_endpoint, get_balance_endpoint,
    get_customer_endpoint, search_customers_endpoint,
};
