//! Derives customer balances from the transaction log.
//!
//! The log keeps the true signed total: sales add their amount, every other
//! type subtracts it. The balance shown to clients is the signed total
//! clamped at zero. Clamping only at display time keeps deletion an exact
//! inverse: removing a transaction restores the balance to what it would have
//! been had the transaction never existed.

use rusqlite::Connection;

use crate::{Error, database_id::CustomerId, transaction::core::TransactionType};

/// The signed balance effect of a single transaction.
pub fn effect(transaction_type: TransactionType, amount: i64) -> i64 {
    if transaction_type.is_debt_decreaser() {
        -amount
    } else {
        amount
    }
}

/// The true signed sum of a customer's transaction effects.
///
/// Aggregation is commutative, so the replay order does not matter.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn signed_total(customer_id: CustomerId, connection: &Connection) -> Result<i64, Error> {
    let total = connection
        .prepare("SELECT type, amount FROM \"transaction\" WHERE customer_id = :customer_id")?
        .query_map(&[(":customer_id", &customer_id)], |row| {
            Ok((row.get::<_, TransactionType>(0)?, row.get::<_, i64>(1)?))
        })?
        .try_fold(0_i64, |total, row| {
            row.map(|(transaction_type, amount)| total + effect(transaction_type, amount))
        })?;

    Ok(total)
}

/// The balance shown to clients: the signed total clamped at zero.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn displayed_balance(customer_id: CustomerId, connection: &Connection) -> Result<i64, Error> {
    signed_total(customer_id, connection).map(clamp)
}

/// Clamp a signed total to the non-negative balance shown to clients.
pub fn clamp(signed_total: i64) -> i64 {
    signed_total.max(0)
}

#[cfg(test)]
mod balance_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        customer::create_customer,
        db::initialize,
        transaction::{
            classify::{LedgerEntry, SaleType},
            core::{TransactionType, append_transaction, delete_transaction},
        },
    };

    use super::{displayed_balance, effect, signed_total};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_customer(conn: &Connection) -> i64 {
        create_customer("Ana Reyes", "Av. Costanera 45", "Sector Centro", conn)
            .unwrap()
            .id
    }

    fn append(
        customer_id: i64,
        transaction_type: TransactionType,
        amount: i64,
        conn: &Connection,
    ) -> i64 {
        let sale_type = match transaction_type {
            TransactionType::Sale => Some(SaleType::NewSale),
            _ => None,
        };
        let entry = LedgerEntry {
            transaction_type,
            sale_type,
            amount,
            detail: "test".to_owned(),
            date: date!(2026 - 04 - 01),
            item_count: None,
        };

        append_transaction(customer_id, &entry, conn)
            .expect("Could not append transaction")
            .id
    }

    #[test]
    fn new_customer_has_zero_balance() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);

        assert_eq!(displayed_balance(customer_id, &conn), Ok(0));
    }

    #[test]
    fn sale_then_payment() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);

        append(customer_id, TransactionType::Sale, 1000, &conn);
        assert_eq!(displayed_balance(customer_id, &conn), Ok(1000));

        append(customer_id, TransactionType::Payment, 500, &conn);
        assert_eq!(displayed_balance(customer_id, &conn), Ok(500));
    }

    #[test]
    fn fault_discount_subtracts_exactly_its_amount() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);
        append(customer_id, TransactionType::Sale, 2000, &conn);

        append(customer_id, TransactionType::FaultDiscount, 800, &conn);

        assert_eq!(displayed_balance(customer_id, &conn), Ok(1200));
    }

    #[test]
    fn refund_subtracts_exactly_its_amount() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);
        append(customer_id, TransactionType::Sale, 1500, &conn);

        append(customer_id, TransactionType::Refund, 600, &conn);

        assert_eq!(displayed_balance(customer_id, &conn), Ok(900));
    }

    #[test]
    fn over_refunding_clamps_display_but_keeps_signed_total() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);
        append(customer_id, TransactionType::Sale, 1000, &conn);
        append(customer_id, TransactionType::Refund, 700, &conn);
        append(customer_id, TransactionType::FaultDiscount, 700, &conn);

        assert_eq!(signed_total(customer_id, &conn), Ok(-400));
        assert_eq!(displayed_balance(customer_id, &conn), Ok(0));
    }

    #[test]
    fn forgiveness_with_stored_amount_zeroes_the_balance() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);
        append(customer_id, TransactionType::Sale, 2500, &conn);

        // The classifier fixes the forgiven amount to the balance before.
        append(customer_id, TransactionType::DebtForgiveness, 2500, &conn);

        assert_eq!(displayed_balance(customer_id, &conn), Ok(0));
    }

    #[test]
    fn deletion_is_an_exact_inverse() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);
        append(customer_id, TransactionType::Sale, 1000, &conn);
        let payment_id = append(customer_id, TransactionType::Payment, 400, &conn);
        assert_eq!(displayed_balance(customer_id, &conn), Ok(600));

        delete_transaction(customer_id, payment_id, &conn).unwrap();

        assert_eq!(displayed_balance(customer_id, &conn), Ok(1000));
    }

    #[test]
    fn deleting_the_sole_transaction_returns_balance_to_zero() {
        let conn = get_test_connection();
        let customer_id = create_test_customer(&conn);
        let sale_id = append(customer_id, TransactionType::Sale, 1800, &conn);
        assert_eq!(displayed_balance(customer_id, &conn), Ok(1800));

        delete_transaction(customer_id, sale_id, &conn).unwrap();

        assert_eq!(signed_total(customer_id, &conn), Ok(0));
        assert_eq!(displayed_balance(customer_id, &conn), Ok(0));
    }

    #[test]
    fn effects_are_signed_by_type() {
        assert_eq!(effect(TransactionType::Sale, 1000), 1000);
        assert_eq!(effect(TransactionType::Payment, 500), -500);
        assert_eq!(effect(TransactionType::Refund, 600), -600);
        assert_eq!(effect(TransactionType::FaultDiscount, 800), -800);
        assert_eq!(effect(TransactionType::DebtForgiveness, 2500), -2500);
    }
}
