//! The API endpoint URIs.

/// The route to create a customer (POST) or search customers by name (GET).
pub const CUSTOMERS: &str = "/api/customers";
/// The route to fetch a single customer with its current balance.
pub const CUSTOMER: &str = "/api/customers/{customer_id}";
/// The route to fetch a customer's displayed balance.
pub const CUSTOMER_BALANCE: &str = "/api/customers/{customer_id}/balance";
/// The route to create (POST) or list (GET) a customer's transactions.
pub const CUSTOMER_TRANSACTIONS: &str = "/api/customers/{customer_id}/transactions";
/// The route to delete a single transaction of a customer.
pub const CUSTOMER_TRANSACTION: &str =
    "/api/customers/{customer_id}/transactions/{transaction_id}";
/// The route to list all transactions across customers, with paging.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for per-month sale and payment totals.
pub const TRANSACTIONS_SUMMARY: &str = "/api/transactions/summary";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::CUSTOMERS);
        assert_endpoint_is_valid_uri(endpoints::CUSTOMER);
        assert_endpoint_is_valid_uri(endpoints::CUSTOMER_BALANCE);
        assert_endpoint_is_valid_uri(endpoints::CUSTOMER_TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::CUSTOMER_TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_SUMMARY);
    }
}
