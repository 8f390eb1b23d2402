use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::RecordError;
use super::record::{DEFAULT_CURRENCY, TransactionRecord};
use super::{Statement, StatementMetadata};

// @module: Alipay statement export parsing

// @const: Metadata line patterns; both ASCII and full-width colons occur in exports
static ACCOUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^账号[:：]\s*\[?([^\]]*?)\]?\s*$").unwrap()
});

static DATE_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"起始日期[:：]\s*\[(\d{4}-\d{2}-\d{2})[^\]]*\]\s*终止日期[:：]\s*\[(\d{4}-\d{2}-\d{2})").unwrap()
});

static RECORD_COUNT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^共(\d+)笔记录").unwrap());

static INCOME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"已收入[:：]\s*(\d+)笔\s*[,，]\s*([\d.]+)元").unwrap()
});

static EXPENSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"已支出[:：]\s*(\d+)笔\s*[,，]\s*([\d.]+)元").unwrap()
});

static EXPORT_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"导出时间[:：]\s*\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]").unwrap()
});

/// First cell of the column header row
const HEADER_MARKER: &str = "交易号";

/// Lines starting with this end the transaction section
const FOOTER_MARKER: &str = "---";

/// Parser over the decoded text of one export.
///
/// Parsing is a pure transform: `records()` can be called any number of
/// times and always starts again from the first row.
pub struct StatementParser<'a> {
    content: &'a str,
    currency: String,
}

/// Lazy iterator over the rows of the transaction section
pub struct Records<'a> {
    rows: StringRecordsIntoIter<&'a [u8]>,
    first_line: u64,
    currency: String,
}

impl<'a> StatementParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Currency stamped on every record
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Locate the transaction rows: the text between the header row and the
    /// footer separator, plus the 1-based line number of its first row
    fn transaction_section(&self) -> Option<(&'a str, u64)> {
        let mut offset = 0;
        let mut section_start: Option<(usize, u64)> = None;

        for (index, line) in self.content.split_inclusive('\n').enumerate() {
            let trimmed = line.trim_start();
            match section_start {
                None if trimmed.starts_with(HEADER_MARKER) => {
                    section_start = Some((offset + line.len(), index as u64 + 2));
                }
                Some((start, first_line)) if trimmed.starts_with(FOOTER_MARKER) => {
                    return Some((&self.content[start..offset], first_line));
                }
                _ => {}
            }
            offset += line.len();
        }

        section_start.map(|(start, first_line)| (&self.content[start..], first_line))
    }

    /// Lazily parse every transaction row
    pub fn records(&self) -> Records<'a> {
        let (section, first_line) = self.transaction_section().unwrap_or(("", 1));
        let rows = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(section.as_bytes())
            .into_records();

        Records {
            rows,
            first_line,
            currency: self.currency.clone(),
        }
    }

    /// Read the account, period, totals and export time lines
    pub fn metadata(&self) -> StatementMetadata {
        let mut metadata = StatementMetadata::default();

        for line in self.content.lines() {
            let line = line.trim();

            if let Some(caps) = ACCOUNT_REGEX.captures(line) {
                let account = caps[1].trim();
                if !account.is_empty() {
                    metadata.account = Some(account.to_string());
                }
            } else if let Some(caps) = DATE_RANGE_REGEX.captures(line) {
                metadata.start_date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok();
                metadata.end_date = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d").ok();
            } else if let Some(caps) = RECORD_COUNT_REGEX.captures(line) {
                metadata.declared_records = caps[1].parse().ok();
            }

            if let Some(caps) = INCOME_REGEX.captures(line) {
                metadata.total_income = Decimal::from_str(&caps[2]).ok();
            }
            if let Some(caps) = EXPENSE_REGEX.captures(line) {
                metadata.total_expense = Decimal::from_str(&caps[2]).ok();
            }
            if let Some(caps) = EXPORT_TIME_REGEX.captures(line) {
                metadata.export_time =
                    NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S").ok();
            }
        }

        metadata
    }

    /// Parse the whole export, skipping malformed records with a warning
    pub fn parse(&self) -> Statement {
        if self.transaction_section().is_none() {
            warn!("No '{}' header row found; the export contains no transactions", HEADER_MARKER);
        }

        let mut records = Vec::new();
        let mut skipped = 0;

        for result in self.records() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping malformed record: {}", e);
                    skipped += 1;
                }
            }
        }

        let metadata = self.metadata();
        if let Some(declared) = metadata.declared_records {
            if declared != records.len() + skipped {
                warn!(
                    "Export declares {} records but {} rows were found",
                    declared,
                    records.len() + skipped
                );
            }
        }

        debug!("Parsed {} records, skipped {}", records.len(), skipped);

        Statement {
            metadata,
            records,
            skipped,
        }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<TransactionRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let result = self.rows.next()?;
            match result {
                Ok(row) => {
                    if row.iter().all(|cell| cell.is_empty()) {
                        continue;
                    }
                    let line = row
                        .position()
                        .map_or(self.first_line, |p| self.first_line + p.line() - 1);
                    return Some(TransactionRecord::from_row(&row, line, &self.currency));
                }
                Err(e) => {
                    let line = e
                        .position()
                        .map_or(self.first_line, |p| self.first_line + p.line() - 1);
                    return Some(Err(RecordError::Malformed {
                        line,
                        message: e.to_string(),
                    }));
                }
            }
        }
    }
}
