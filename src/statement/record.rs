use chrono::NaiveDateTime;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::errors::RecordError;

// @module: Typed transaction records of an Alipay export

/// Placeholder used when a record carries no counterparty
pub const UNKNOWN_COUNTERPARTY: &str = "Unknown";

/// Currency Alipay statements are denominated in
pub const DEFAULT_CURRENCY: &str = "CNY";

/// Number of data columns in the export layout
pub const FIELD_COUNT: usize = 16;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M"];

/// Whether money entered or left the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    /// Map the export's income/expense label. Only income counts as a credit;
    /// expenses, neutral transfers and empty labels are debits.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "收入" | "income" | "credit" => Self::Credit,
            _ => Self::Debit,
        }
    }

    /// OFX transaction type
    pub fn ofx_type(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Debit => write!(f, "debit"),
        }
    }
}

// @struct: One parsed statement row
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    // @field: 1-based line in the source file
    pub line: u64,
    // @field: Alipay trade number
    pub trade_no: String,
    pub merchant_order_no: String,
    pub created_at: Option<NaiveDateTime>,
    pub paid_at: Option<NaiveDateTime>,
    pub modified_at: Option<NaiveDateTime>,
    pub source: String,
    // @field: Transaction type column
    pub category: String,
    pub counterparty: String,
    // @field: Item description, used as memo
    pub item_name: String,
    // @field: Unsigned amount as exported
    pub amount: Decimal,
    pub currency: String,
    pub direction: Direction,
    pub status: String,
    pub service_fee: Decimal,
    pub refunded: Decimal,
    pub remarks: String,
    pub fund_status: String,
}

impl TransactionRecord {
    /// Creates a record with the fields the OFX output needs; everything else empty
    pub fn new(
        trade_no: impl Into<String>,
        paid_at: Option<NaiveDateTime>,
        counterparty: impl Into<String>,
        item_name: impl Into<String>,
        amount: Decimal,
        direction: Direction,
    ) -> Self {
        Self {
            line: 0,
            trade_no: trade_no.into(),
            merchant_order_no: String::new(),
            created_at: None,
            paid_at,
            modified_at: None,
            source: String::new(),
            category: String::new(),
            counterparty: counterparty.into(),
            item_name: item_name.into(),
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            direction,
            status: String::new(),
            service_fee: Decimal::ZERO,
            refunded: Decimal::ZERO,
            remarks: String::new(),
            fund_status: String::new(),
        }
    }

    /// Build a record from one trimmed CSV row
    pub fn from_row(row: &StringRecord, line: u64, currency: &str) -> Result<Self, RecordError> {
        if row.len() < FIELD_COUNT {
            return Err(RecordError::TooFewFields {
                line,
                expected: FIELD_COUNT,
                found: row.len(),
            });
        }

        let cell = |index: usize| row.get(index).unwrap_or("").trim();

        let amount_cell = cell(9);
        if amount_cell.is_empty() {
            return Err(RecordError::MissingAmount { line });
        }
        let amount = parse_decimal(amount_cell, line, "amount")?;

        let counterparty = match cell(7) {
            "" | "/" => UNKNOWN_COUNTERPARTY.to_string(),
            name => name.to_string(),
        };

        Ok(Self {
            line,
            trade_no: cell(0).to_string(),
            merchant_order_no: cell(1).to_string(),
            created_at: parse_timestamp(cell(2), line, "creation time")?,
            paid_at: parse_timestamp(cell(3), line, "payment time")?,
            modified_at: parse_timestamp(cell(4), line, "modification time")?,
            source: cell(5).to_string(),
            category: cell(6).to_string(),
            counterparty,
            item_name: cell(8).to_string(),
            amount,
            currency: currency.to_string(),
            direction: Direction::from_label(cell(10)),
            status: cell(11).to_string(),
            service_fee: parse_optional_decimal(cell(12), line, "service fee")?,
            refunded: parse_optional_decimal(cell(13), line, "refund")?,
            remarks: cell(14).to_string(),
            fund_status: cell(15).to_string(),
        })
    }

    /// Best available timestamp: payment, then creation, then last modification
    pub fn posted_at(&self) -> Option<NaiveDateTime> {
        self.paid_at.or(self.created_at).or(self.modified_at)
    }

    /// Amount signed by direction: credits positive, debits negative
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Credit => self.amount.abs(),
            Direction::Debit => -self.amount.abs(),
        }
    }
}

/// Parse an export timestamp; an empty cell is `None`
pub fn parse_timestamp(
    value: &str,
    line: u64,
    field: &'static str,
) -> Result<Option<NaiveDateTime>, RecordError> {
    if value.is_empty() {
        return Ok(None);
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(Some)
        .ok_or_else(|| RecordError::InvalidTimestamp {
            line,
            field,
            value: value.to_string(),
        })
}

fn parse_decimal(value: &str, line: u64, field: &'static str) -> Result<Decimal, RecordError> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | '￥' | ' '))
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| RecordError::InvalidDecimal {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_optional_decimal(value: &str, line: u64, field: &'static str) -> Result<Decimal, RecordError> {
    if value.is_empty() {
        Ok(Decimal::ZERO)
    } else {
        parse_decimal(value, line, field)
    }
}
