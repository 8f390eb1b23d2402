/*!
 * Alipay statement export reading.
 *
 * - `record`: typed transaction rows and field parsing
 * - `parser`: splitting an export into metadata and lazily parsed records
 */

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

pub mod parser;
pub mod record;

pub use parser::{Records, StatementParser};
pub use record::{Direction, TransactionRecord, UNKNOWN_COUNTERPARTY};

/// Statement-level values found in the export's preamble and footer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementMetadata {
    /// Alipay account (phone number or e-mail)
    pub account: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// When the export was generated
    pub export_time: Option<NaiveDateTime>,
    /// Record count the export claims to contain
    pub declared_records: Option<usize>,
    pub total_income: Option<Decimal>,
    pub total_expense: Option<Decimal>,
}

/// A parsed export: metadata plus the records that parsed cleanly, in file order
#[derive(Debug, Clone, Default)]
pub struct Statement {
    pub metadata: StatementMetadata,
    pub records: Vec<TransactionRecord>,
    /// Malformed rows left out of `records`
    pub skipped: usize,
}
