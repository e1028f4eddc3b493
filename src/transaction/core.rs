//! Defines the core data models and database queries for the transaction log.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{CustomerId, TransactionId},
    transaction::classify::{LedgerEntry, SaleType},
};

// ============================================================================
// MODELS
// ============================================================================

/// The kind of financial event recorded against a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// A sale on credit, increasing the customer's outstanding balance.
    Sale,
    /// A payment ("abono") made by the customer.
    Payment,
    /// A refund ("devolución") for returned goods.
    Refund,
    /// A discount compensating a product fault ("descuento por falla").
    FaultDiscount,
    /// Debt forgiveness ("condonación"), zeroing the outstanding balance.
    DebtForgiveness,
}

impl TransactionType {
    /// All transaction types, in display order.
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Sale,
        TransactionType::Payment,
        TransactionType::Refund,
        TransactionType::FaultDiscount,
        TransactionType::DebtForgiveness,
    ];

    /// The stable identifier stored in the database and used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Sale => "SALE",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Refund => "REFUND",
            TransactionType::FaultDiscount => "FAULT_DISCOUNT",
            TransactionType::DebtForgiveness => "DEBT_FORGIVENESS",
        }
    }

    /// Parse the wire identifier, e.g. "FAULT_DISCOUNT".
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|transaction_type| transaction_type.as_str() == text)
    }

    /// The Spanish label shown to users.
    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Sale => "Venta",
            TransactionType::Payment => "Abono",
            TransactionType::Refund => "Devolución",
            TransactionType::FaultDiscount => "Descuento por falla",
            TransactionType::DebtForgiveness => "Condonación de deuda",
        }
    }

    /// Whether this type decreases the customer's outstanding balance.
    pub fn is_debt_decreaser(self) -> bool {
        !matches!(self, TransactionType::Sale)
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        TransactionType::parse(text).ok_or_else(|| {
            FromSqlError::Other(format!("unknown transaction type \"{text}\"").into())
        })
    }
}

/// A financial event in a customer's ledger.
///
/// Transactions are immutable facts once created, aside from deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the customer this transaction belongs to.
    pub customer_id: CustomerId,
    /// The kind of event.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// For sales, whether this was a new sale or a maintenance sale.
    ///
    /// The tag is fixed at creation time: later transactions change the
    /// balance, so re-deriving it would corrupt historical labels.
    pub sale_type: Option<SaleType>,
    /// The positive amount of money involved.
    pub amount: i64,
    /// A text description of the event.
    pub detail: String,
    /// The calendar date the event happened.
    pub date: Date,
    /// For sales, the number of items sold.
    pub item_count: Option<i64>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_id INTEGER NOT NULL,
                type TEXT NOT NULL,
                sale_type TEXT,
                amount INTEGER NOT NULL,
                detail TEXT NOT NULL,
                date TEXT NOT NULL,
                item_count INTEGER,
                FOREIGN KEY(customer_id) REFERENCES customer(id)
                )",
        (),
    )?;

    // Index used by per-customer listing and balance recomputation.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_customer ON \"transaction\"(customer_id);",
        (),
    )?;

    Ok(())
}

/// Append a validated ledger entry to a customer's transaction log.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `customer_id` does not refer to a valid customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn append_transaction(
    customer_id: CustomerId,
    entry: &LedgerEntry,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (customer_id, type, sale_type, amount, detail, date, item_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, customer_id, type, sale_type, amount, detail, date, item_count",
        )?
        .query_row(
            (
                customer_id,
                entry.transaction_type,
                entry.sale_type,
                entry.amount,
                &entry.detail,
                entry.date,
                entry.item_count,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction of a customer by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction of this customer,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    customer_id: CustomerId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, customer_id, type, sale_type, amount, detail, date, item_count
             FROM \"transaction\" WHERE id = :id AND customer_id = :customer_id",
        )?
        .query_one(
            &[(":id", &id), (":customer_id", &customer_id)],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// List a customer's transactions in insertion order, optionally keeping only
/// one type.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    customer_id: CustomerId,
    type_filter: Option<TransactionType>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    // Insertion order is the chronological order of the ledger.
    let query = match type_filter {
        Some(_) => {
            "SELECT id, customer_id, type, sale_type, amount, detail, date, item_count
             FROM \"transaction\"
             WHERE customer_id = :customer_id AND type = :type
             ORDER BY id ASC"
        }
        None => {
            "SELECT id, customer_id, type, sale_type, amount, detail, date, item_count
             FROM \"transaction\"
             WHERE customer_id = :customer_id
             ORDER BY id ASC"
        }
    };

    let mut statement = connection.prepare(query)?;

    let rows = match type_filter {
        Some(transaction_type) => statement.query_map(
            &[
                (":customer_id", &customer_id as &dyn ToSql),
                (":type", &transaction_type),
            ],
            map_transaction_row,
        )?,
        None => statement.query_map(&[(":customer_id", &customer_id)], map_transaction_row)?,
    };

    rows.map(|row_result| row_result.map_err(Error::from))
        .collect()
}

/// List transactions across all customers, newest first, with paging.
///
/// `page` is zero-based. The caller is expected to have sanitized `page` and
/// `per_page` already.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_all_transactions(
    type_filter: Option<TransactionType>,
    page: u32,
    per_page: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = match type_filter {
        Some(_) => {
            "SELECT id, customer_id, type, sale_type, amount, detail, date, item_count
             FROM \"transaction\"
             WHERE type = :type
             ORDER BY date DESC, id DESC
             LIMIT :limit OFFSET :offset"
        }
        None => {
            "SELECT id, customer_id, type, sale_type, amount, detail, date, item_count
             FROM \"transaction\"
             ORDER BY date DESC, id DESC
             LIMIT :limit OFFSET :offset"
        }
    };

    let limit = per_page as i64;
    let offset = page as i64 * per_page as i64;
    let mut statement = connection.prepare(query)?;

    let rows = match type_filter {
        Some(transaction_type) => statement.query_map(
            &[
                (":type", &transaction_type as &dyn ToSql),
                (":limit", &limit),
                (":offset", &offset),
            ],
            map_transaction_row,
        )?,
        None => statement.query_map(
            &[(":limit", &limit as &dyn ToSql), (":offset", &offset)],
            map_transaction_row,
        )?,
    };

    rows.map(|row_result| row_result.map_err(Error::from))
        .collect()
}

/// Count transactions, optionally keeping only one type.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    type_filter: Option<TransactionType>,
    connection: &Connection,
) -> Result<u32, Error> {
    let count = match type_filter {
        Some(transaction_type) => connection.query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE type = :type",
            &[(":type", &transaction_type)],
            |row| row.get(0),
        )?,
        None => connection.query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| {
            row.get(0)
        })?,
    };

    Ok(count)
}

/// Delete a transaction of a customer, returning the number of rows removed.
///
/// Zero rows means the transaction did not exist for this customer. The
/// caller must recompute the customer's balance afterwards.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    customer_id: CustomerId,
    id: TransactionId,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND customer_id = :customer_id",
            &[(":id", &id), (":customer_id", &customer_id)],
        )
        .map_err(|error| error.into())
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        transaction_type: row.get(2)?,
        sale_type: row.get(3)?,
        amount: row.get(4)?,
        detail: row.get(5)?,
        date: row.get(6)?,
        item_count: row.get(7)?,
    })
}

/// Parse an optional transaction type filter from a query string value.
///
/// An absent or empty value means "all types".
///
/// # Errors
/// Returns [Error::UnknownTransactionType] if the value is not a known type.
pub fn parse_type_filter(filter: Option<&str>) -> Result<Option<TransactionType>, Error> {
    match filter {
        None => Ok(None),
        Some(text) if text.is_empty() => Ok(None),
        Some(text) => TransactionType::parse(text)
            .map(Some)
            .ok_or_else(|| Error::UnknownTransactionType(text.to_owned())),
    }
}

// ============================================================================
// TESTS
// ============================================================================
