use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::statement::{StatementMetadata, TransactionRecord};

// @module: OFX statement model and its construction from parsed records

/// OFX 1.02 limit for the NAME element
pub const MAX_NAME_CHARS: usize = 32;

/// Length of derived transaction ids
const DERIVED_ID_LEN: usize = 32;

/// Server time used when neither the export nor any record has a timestamp
fn fallback_server_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Timezone suffix of OFX datetimes, e.g. `[+8:CST]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfxTimezone {
    pub offset_hours: i32,
    pub name: String,
}

impl Default for OfxTimezone {
    fn default() -> Self {
        Self {
            offset_hours: 8,
            name: "CST".to_string(),
        }
    }
}

impl OfxTimezone {
    /// Format a local datetime as `YYYYMMDDHHMMSS.000[+8:CST]`
    pub fn format(&self, datetime: &NaiveDateTime) -> String {
        format!("{}.000[{:+}:{}]", datetime.format("%Y%m%d%H%M%S"), self.offset_hours, self.name)
    }
}

/// Account and institution values that go into the document
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub bank_id: String,
    /// Financial institution organisation name
    pub org: String,
    /// Financial institution id
    pub fid: String,
    /// Overrides the account found in the export
    pub account_id: Option<String>,
    pub account_type: String,
    pub currency: String,
    pub language: String,
    pub timezone: OfxTimezone,
    /// Closing balance; the export does not contain it
    pub ledger_balance: Option<Decimal>,
    pub ledger_date: Option<NaiveDate>,
}

impl Default for AccountInfo {
    fn default() -> Self {
        Self {
            bank_id: "ALIPAY".to_string(),
            org: "ALIPAY".to_string(),
            fid: "NOFID".to_string(),
            account_id: None,
            account_type: "CHECKING".to_string(),
            currency: "CNY".to_string(),
            language: "ENG".to_string(),
            timezone: OfxTimezone::default(),
            ledger_balance: None,
            ledger_date: None,
        }
    }
}

/// A record together with the (possibly translated) texts to show for it
#[derive(Debug, Clone)]
pub struct LocalizedRecord {
    pub record: TransactionRecord,
    /// Payee text
    pub name: String,
    /// Memo text
    pub memo: String,
}

impl LocalizedRecord {
    /// Use the record's own texts
    pub fn untranslated(record: TransactionRecord) -> Self {
        Self {
            name: record.counterparty.clone(),
            memo: record.item_name.clone(),
            record,
        }
    }
}

/// Sign-on response section
#[derive(Debug, Clone, PartialEq)]
pub struct SignOn {
    pub server_time: NaiveDateTime,
    pub language: String,
    pub org: String,
    pub fid: String,
}

/// One STMTTRN entry
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTransaction {
    pub transaction_type: String,
    /// `None` when the record had no timestamp at all
    pub posted: Option<NaiveDateTime>,
    /// Signed: credits positive, debits negative
    pub amount: Decimal,
    pub fitid: String,
    pub name: String,
    pub memo: Option<String>,
}

/// Bank statement response section
#[derive(Debug, Clone, PartialEq)]
pub struct BankStatement {
    pub transaction_uid: String,
    pub currency: String,
    pub bank_id: String,
    pub account_id: String,
    pub account_type: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub transactions: Vec<StatementTransaction>,
    pub ledger_balance: Decimal,
    pub ledger_as_of: NaiveDateTime,
}

/// Complete interchange document, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct OfxDocument {
    pub timezone: OfxTimezone,
    pub signon: SignOn,
    pub statement: BankStatement,
}

/// Assembles an `OfxDocument` from parsed records
pub struct DocumentBuilder {
    account: AccountInfo,
}

impl DocumentBuilder {
    pub fn new(account: AccountInfo) -> Self {
        Self { account }
    }

    /// Build the document; output transactions keep the order of `entries`
    pub fn build(&self, metadata: &StatementMetadata, entries: Vec<LocalizedRecord>) -> OfxDocument {
        let posted: Vec<NaiveDateTime> = entries.iter().filter_map(|e| e.record.posted_at()).collect();
        let earliest = posted.iter().min().copied();
        let latest = posted.iter().max().copied();

        let server_time = metadata.export_time
            .or(latest)
            .unwrap_or_else(fallback_server_time);

        let start = metadata.start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .or(earliest)
            .unwrap_or(server_time);
        let end = metadata.end_date
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .or(latest)
            .unwrap_or(server_time);

        let account_id = self.account.account_id.clone()
            .or_else(|| metadata.account.clone())
            .unwrap_or_else(|| {
                warn!("No account id in the export or the options, using UNKNOWN");
                "UNKNOWN".to_string()
            });

        let ledger_balance = normalize_amount(self.account.ledger_balance.unwrap_or_else(|| {
            warn!("No ledger balance supplied, writing 0.00");
            Decimal::ZERO
        }));
        let ledger_as_of = self.account.ledger_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(end);

        let mut ids = TransactionIds::default();
        let transactions = entries.into_iter()
            .map(|entry| self.transaction(entry, &mut ids))
            .collect::<Vec<_>>();

        debug!("Built OFX document with {} transactions", transactions.len());

        OfxDocument {
            timezone: self.account.timezone.clone(),
            signon: SignOn {
                server_time,
                language: self.account.language.clone(),
                org: self.account.org.clone(),
                fid: self.account.fid.clone(),
            },
            statement: BankStatement {
                transaction_uid: "1".to_string(),
                currency: self.account.currency.clone(),
                bank_id: self.account.bank_id.clone(),
                account_id,
                account_type: self.account.account_type.clone(),
                start,
                end,
                transactions,
                ledger_balance,
                ledger_as_of,
            },
        }
    }

    fn transaction(&self, entry: LocalizedRecord, ids: &mut TransactionIds) -> StatementTransaction {
        let record = &entry.record;
        let memo = entry.memo.trim();

        StatementTransaction {
            transaction_type: record.direction.ofx_type().to_string(),
            posted: record.posted_at(),
            amount: normalize_amount(record.signed_amount()),
            fitid: ids.assign(transaction_id(record)),
            name: truncate_chars(entry.name.trim(), MAX_NAME_CHARS),
            memo: if memo.is_empty() { None } else { Some(memo.to_string()) },
        }
    }
}

/// Stable id for a record: its trade number, or a digest of its contents
pub fn transaction_id(record: &TransactionRecord) -> String {
    if !record.trade_no.is_empty() {
        return record.trade_no.clone();
    }

    let posted = record.posted_at()
        .map(|t| t.format("%Y%m%d%H%M%S").to_string())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}|{}",
        posted,
        normalize_amount(record.signed_amount()),
        record.counterparty,
        record.item_name
    ));
    let digest = format!("{:x}", hasher.finalize());
    digest[..DERIVED_ID_LEN].to_string()
}

/// Hands out ids, suffixing `-2`, `-3`, ... to repeats in input order
#[derive(Debug, Default)]
struct TransactionIds {
    used: HashSet<String>,
}

impl TransactionIds {
    fn assign(&mut self, id: String) -> String {
        if self.used.insert(id.clone()) {
            return id;
        }
        let mut ordinal = 2;
        loop {
            let candidate = format!("{}-{}", id, ordinal);
            if self.used.insert(candidate.clone()) {
                debug!("Transaction id {} already used, assigned {}", id, candidate);
                return candidate;
            }
            ordinal += 1;
        }
    }
}

/// Two decimal places, and never a negative zero
fn normalize_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(2);
    rounded
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
