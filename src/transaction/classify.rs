//! Classification and per-type validation of new transactions.
//!
//! Classification happens once, at creation time: a sale registered while the
//! customer still owes money is a "maintenance" sale, a sale on a settled
//! account is a "new" sale. The resulting tag is stored with the transaction.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, money::parse_money, transaction::core::TransactionType};

/// How a sale is labelled, decided by the customer's balance at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleType {
    /// A sale to a customer with no outstanding balance.
    NewSale,
    /// A sale to a customer who still owed money, keeping the account alive.
    Maintenance,
}

impl SaleType {
    /// The stable identifier stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            SaleType::NewSale => "NEW_SALE",
            SaleType::Maintenance => "MAINTENANCE",
        }
    }
}

impl ToSql for SaleType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for SaleType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "NEW_SALE" => Ok(SaleType::NewSale),
            "MAINTENANCE" => Ok(SaleType::Maintenance),
            other => Err(FromSqlError::Other(
                format!("unknown sale type \"{other}\"").into(),
            )),
        }
    }
}

/// The accepted reasons for forgiving a customer's debt.
///
/// Forgiveness carries a reason rather than a negotiated amount; its effect is
/// always to zero the outstanding balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForgivenessReason {
    /// The debt was waived as a discount for paying the rest in cash.
    #[serde(rename = "Descuento por pago contado")]
    CashPaymentDiscount,
    /// The debt is considered uncollectible.
    #[serde(rename = "Deuda incobrable")]
    UncollectibleDebt,
    /// The debt was waived as part of an agreement with the customer.
    #[serde(rename = "Acuerdo con el cliente")]
    CustomerAgreement,
}

impl ForgivenessReason {
    /// The Spanish label shown to users, also stored as the transaction detail.
    pub fn as_str(self) -> &'static str {
        match self {
            ForgivenessReason::CashPaymentDiscount => "Descuento por pago contado",
            ForgivenessReason::UncollectibleDebt => "Deuda incobrable",
            ForgivenessReason::CustomerAgreement => "Acuerdo con el cliente",
        }
    }
}

/// A request to record a transaction, as it arrives from the client.
///
/// Amounts are strings because the client may send them with display
/// formatting, e.g. "$2.500".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionRequest {
    /// The raw, possibly formatted amount.
    pub amount: Option<String>,
    /// A text description of the event.
    pub detail: Option<String>,
    /// The calendar date the event happened.
    pub date: Option<Date>,
    /// For sales, the number of items sold.
    pub items: Option<i64>,
    /// For debt forgiveness, why the debt was waived.
    pub reason: Option<ForgivenessReason>,
}

/// A validated, classified transaction ready to be appended to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// The kind of event.
    pub transaction_type: TransactionType,
    /// The sale tag, present only for sales.
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

/// Validate a [TransactionRequest] against its type's rules and classify it.
///
/// `balance_before` is the customer's displayed balance before this
/// transaction; it decides the sale tag and the amount forgiven.
/// `today` is used when the type allows an implicit date.
///
/// # Errors
/// Returns a validation error ([Error::InvalidAmount],
/// [Error::InvalidItemCount], [Error::MissingField], or
/// [Error::NothingToForgive]) when a per-type rule is violated. No state is
/// changed by this function.
pub fn classify(
    transaction_type: TransactionType,
    request: &TransactionRequest,
    balance_before: i64,
    today: Date,
) -> Result<LedgerEntry, Error> {
    match transaction_type {
        TransactionType::Sale => {
            let amount = required_amount(request)?;
            let detail = required_detail(request, "detail")?;

            if request.items.is_some_and(|items| items <= 0) {
                return Err(Error::InvalidItemCount);
            }

            let sale_type = if balance_before > 0 {
                SaleType::Maintenance
            } else {
                SaleType::NewSale
            };

            Ok(LedgerEntry {
                transaction_type,
                sale_type: Some(sale_type),
                amount,
                detail,
                date: request.date.unwrap_or(today),
                item_count: request.items,
            })
        }
        TransactionType::Payment => {
            let amount = required_amount(request)?;

            Ok(LedgerEntry {
                transaction_type,
                sale_type: None,
                amount,
                detail: format!("[Abono]: ${amount}"),
                date: request.date.unwrap_or(today),
                item_count: None,
            })
        }
        TransactionType::Refund => {
            let amount = required_amount(request)?;
            let date = required_date(request)?;
            let detail = request
                .detail
                .as_deref()
                .map(str::trim)
                .filter(|detail| !detail.is_empty())
                .unwrap_or(transaction_type.label())
                .to_owned();

            Ok(LedgerEntry {
                transaction_type,
                sale_type: None,
                amount,
                detail,
                date,
                item_count: None,
            })
        }
        TransactionType::FaultDiscount => {
            let amount = required_amount(request)?;
            let date = required_date(request)?;
            let detail = required_detail(request, "detail")?;

            Ok(LedgerEntry {
                transaction_type,
                sale_type: None,
                amount,
                detail,
                date,
                item_count: None,
            })
        }
        TransactionType::DebtForgiveness => {
            let reason = request.reason.ok_or(Error::MissingField("reason"))?;
            let date = required_date(request)?;

            // The forgiven amount is fixed here so the entry stays an exact
            // inverse on deletion even after later transactions.
            if balance_before <= 0 {
                return Err(Error::NothingToForgive);
            }

            Ok(LedgerEntry {
                transaction_type,
                sale_type: None,
                amount: balance_before,
                detail: reason.as_str().to_owned(),
                date,
                item_count: None,
            })
        }
    }
}

fn required_amount(request: &TransactionRequest) -> Result<i64, Error> {
    let text = request.amount.as_deref().ok_or(Error::InvalidAmount)?;

    parse_money(text)
}

fn required_detail(request: &TransactionRequest, field: &'static str) -> Result<String, Error> {
    request
        .detail
        .as_deref()
        .map(str::trim)
        .filter(|detail| !detail.is_empty())
        .map(str::to_owned)
        .ok_or(Error::MissingField(field))
}

fn required_date(request: &TransactionRequest) -> Result<Date, Error> {
    request.date.ok_or(Error::MissingField("date"))
}

#[cfg(test)]
mod classify_tests {
    use time::macros::date;

    use crate::{Error, transaction::core::TransactionType};

    use super::{ForgivenessReason, SaleType, TransactionRequest, classify};

    const TODAY: time::Date = date!(2026 - 03 - 01);

    fn sale_request(amount: &str) -> TransactionRequest {
        TransactionRequest {
            amount: Some(amount.to_owned()),
            detail: Some("Venta inicial".to_owned()),
            items: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn first_sale_is_a_new_sale() {
        let entry = classify(TransactionType::Sale, &sale_request("1000"), 0, TODAY).unwrap();

        assert_eq!(entry.sale_type, Some(SaleType::NewSale));
        assert_eq!(entry.amount, 1000);
        assert_eq!(entry.date, TODAY);
    }

    #[test]
    fn sale_with_outstanding_balance_is_maintenance() {
        let entry = classify(TransactionType::Sale, &sale_request("700"), 1000, TODAY).unwrap();

        assert_eq!(entry.sale_type, Some(SaleType::Maintenance));
        // The tag never changes the numeric effect.
        assert_eq!(entry.amount, 700);
    }

    #[test]
    fn sale_accepts_formatted_amounts() {
        let entry = classify(TransactionType::Sale, &sale_request("$2.500"), 0, TODAY).unwrap();

        assert_eq!(entry.amount, 2500);
    }

    #[test]
    fn sale_rejects_missing_detail() {
        let request = TransactionRequest {
            amount: Some("1000".to_owned()),
            detail: Some("   ".to_owned()),
            ..Default::default()
        };

        let result = classify(TransactionType::Sale, &request, 0, TODAY);

        assert_eq!(result, Err(Error::MissingField("detail")));
    }

    #[test]
    fn sale_rejects_non_positive_items() {
        let mut request = sale_request("1000");
        request.items = Some(0);

        let result = classify(TransactionType::Sale, &request, 0, TODAY);

        assert_eq!(result, Err(Error::InvalidItemCount));
    }

    #[test]
    fn payment_generates_detail() {
        let request = TransactionRequest {
            amount: Some("500".to_owned()),
            ..Default::default()
        };

        let entry = classify(TransactionType::Payment, &request, 1000, TODAY).unwrap();

        assert_eq!(entry.detail, "[Abono]: $500");
        assert_eq!(entry.sale_type, None);
        assert_eq!(entry.date, TODAY);
    }

    #[test]
    fn payment_rejects_non_positive_amount() {
        for amount in ["0", "-100", "abc"] {
            let request = TransactionRequest {
                amount: Some(amount.to_owned()),
                ..Default::default()
            };

            let result = classify(TransactionType::Payment, &request, 1000, TODAY);

            assert_eq!(result, Err(Error::InvalidAmount), "amount: {amount}");
        }
    }

    #[test]
    fn refund_requires_date() {
        let request = TransactionRequest {
            amount: Some("600".to_owned()),
            ..Default::default()
        };

        let result = classify(TransactionType::Refund, &request, 1500, TODAY);

        assert_eq!(result, Err(Error::MissingField("date")));
    }

    #[test]
    fn refund_defaults_detail_to_label() {
        let request = TransactionRequest {
            amount: Some("600".to_owned()),
            date: Some(date!(2026 - 03 - 02)),
            ..Default::default()
        };

        let entry = classify(TransactionType::Refund, &request, 1500, TODAY).unwrap();

        assert_eq!(entry.detail, "Devolución");
    }

    #[test]
    fn fault_discount_requires_date_and_detail() {
        let request = TransactionRequest {
            amount: Some("800".to_owned()),
            detail: Some("Falla en producto".to_owned()),
            ..Default::default()
        };

        assert_eq!(
            classify(TransactionType::FaultDiscount, &request, 2000, TODAY),
            Err(Error::MissingField("date"))
        );

        let request = TransactionRequest {
            amount: Some("800".to_owned()),
            date: Some(date!(2026 - 03 - 02)),
            ..Default::default()
        };

        assert_eq!(
            classify(TransactionType::FaultDiscount, &request, 2000, TODAY),
            Err(Error::MissingField("detail"))
        );
    }

    #[test]
    fn forgiveness_takes_the_outstanding_balance_as_amount() {
        let request = TransactionRequest {
            reason: Some(ForgivenessReason::CashPaymentDiscount),
            date: Some(date!(2026 - 03 - 02)),
            // Any stated amount is ignored.
            amount: Some("123".to_owned()),
            ..Default::default()
        };

        let entry = classify(TransactionType::DebtForgiveness, &request, 2500, TODAY).unwrap();

        assert_eq!(entry.amount, 2500);
        assert_eq!(entry.detail, "Descuento por pago contado");
    }

    #[test]
    fn forgiveness_requires_reason_and_date() {
        let request = TransactionRequest {
            date: Some(date!(2026 - 03 - 02)),
            ..Default::default()
        };

        assert_eq!(
            classify(TransactionType::DebtForgiveness, &request, 2500, TODAY),
            Err(Error::MissingField("reason"))
        );

        let request = TransactionRequest {
            reason: Some(ForgivenessReason::UncollectibleDebt),
            ..Default::default()
        };

        assert_eq!(
            classify(TransactionType::DebtForgiveness, &request, 2500, TODAY),
            Err(Error::MissingField("date"))
        );
    }

    #[test]
    fn forgiveness_rejects_settled_accounts() {
        let request = TransactionRequest {
            reason: Some(ForgivenessReason::CustomerAgreement),
            date: Some(date!(2026 - 03 - 02)),
            ..Default::default()
        };

        let result = classify(TransactionType::DebtForgiveness, &request, 0, TODAY);

        assert_eq!(result, Err(Error::NothingToForgive));
    }
}
