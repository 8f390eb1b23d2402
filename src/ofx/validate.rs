use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use crate::errors::ValidationError;

// @module: Structural re-check of written OFX documents

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z0-9.]+)>([^<]*)").unwrap()
});

/// Aggregates every bank statement document must contain
const REQUIRED_AGGREGATES: [&str; 6] = ["OFX", "SONRS", "STMTRS", "BANKACCTFROM", "BANKTRANLIST", "LEDGERBAL"];

/// Elements every STMTTRN must contain
const REQUIRED_TRANSACTION_FIELDS: [&str; 4] = ["TRNTYPE", "DTPOSTED", "TRNAMT", "FITID"];

/// What a valid document contains
#[derive(Debug, Clone, PartialEq)]
pub struct OfxSummary {
    pub transaction_count: usize,
    pub account_id: Option<String>,
    pub currency: Option<String>,
    pub ledger_balance: Option<Decimal>,
}

enum Token<'a> {
    Open(&'a str),
    Close(&'a str),
    Element(&'a str, &'a str),
}

/// Split an SGML body into tokens; elements may omit their end tag
fn tokenize(body: &str) -> Vec<Token<'_>> {
    let captures: Vec<_> = TAG_REGEX.captures_iter(body).collect();
    let mut tokens = Vec::with_capacity(captures.len());
    let mut index = 0;

    while index < captures.len() {
        let cap = &captures[index];
        let closing = !cap[1].is_empty();
        let tag = cap.get(2).map_or("", |m| m.as_str());
        let value = cap.get(3).map_or("", |m| m.as_str().trim());

        if closing {
            tokens.push(Token::Close(tag));
        } else if value.is_empty() {
            tokens.push(Token::Open(tag));
        } else {
            tokens.push(Token::Element(tag, value));
            // Consume the optional end tag of the element
            if let Some(next) = captures.get(index + 1) {
                if !next[1].is_empty() && &next[2] == tag {
                    index += 1;
                }
            }
        }
        index += 1;
    }

    tokens
}

fn unescape(value: &str) -> String {
    value.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

/// Check that `text` is a well-formed OFX 1.x bank statement.
///
/// Verifies the header, tag nesting, the presence of the statement
/// aggregates and the required fields of every transaction.
pub fn validate_ofx(text: &str) -> Result<OfxSummary, ValidationError> {
    let text = text.trim_start_matches('\u{feff}');
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first_line != "OFXHEADER:100" {
        return Err(ValidationError::Header(format!("expected OFXHEADER:100, found '{}'", first_line)));
    }

    let body_start = text.find("<OFX>")
        .ok_or_else(|| ValidationError::Missing("OFX".to_string()))?;
    let header = &text[..body_start];
    if !header.lines().any(|l| l.trim() == "DATA:OFXSGML") {
        return Err(ValidationError::Header("missing DATA:OFXSGML".to_string()));
    }

    let mut stack: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut transaction: Option<HashMap<&str, String>> = None;
    let mut summary = OfxSummary {
        transaction_count: 0,
        account_id: None,
        currency: None,
        ledger_balance: None,
    };

    for token in tokenize(&text[body_start..]) {
        match token {
            Token::Open(tag) => {
                if tag == "STMTTRN" {
                    transaction = Some(HashMap::new());
                }
                seen.insert(tag);
                stack.push(tag);
            }
            Token::Close(tag) => {
                let open = stack.pop().ok_or_else(|| ValidationError::UnexpectedClose(tag.to_string()))?;
                if open != tag {
                    return Err(ValidationError::MismatchedTag {
                        expected: open.to_string(),
                        found: tag.to_string(),
                    });
                }
                if tag == "STMTTRN" {
                    check_transaction(transaction.take().unwrap_or_default())?;
                    summary.transaction_count += 1;
                }
            }
            Token::Element(tag, value) => {
                let value = unescape(value);
                match (stack.last().copied(), tag) {
                    (Some("STMTTRN"), _) => {
                        if let Some(fields) = transaction.as_mut() {
                            fields.insert(tag, value);
                        }
                    }
                    (Some("BANKACCTFROM"), "ACCTID") => summary.account_id = Some(value),
                    (Some("STMTRS"), "CURDEF") => summary.currency = Some(value),
                    (Some("LEDGERBAL"), "BALAMT") => {
                        let balance = Decimal::from_str(&value).map_err(|_| ValidationError::InvalidValue {
                            tag: tag.to_string(),
                            value: value.clone(),
                        })?;
                        summary.ledger_balance = Some(balance);
                    }
                    _ => {}
                }
            }
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ValidationError::Unclosed(open.to_string()));
    }

    for aggregate in REQUIRED_AGGREGATES {
        if !seen.contains(aggregate) {
            return Err(ValidationError::Missing(aggregate.to_string()));
        }
    }

    debug!("Validated OFX document with {} transactions", summary.transaction_count);
    Ok(summary)
}

fn check_transaction(fields: HashMap<&str, String>) -> Result<(), ValidationError> {
    for field in REQUIRED_TRANSACTION_FIELDS {
        if !fields.contains_key(field) {
            return Err(ValidationError::Missing(format!("STMTTRN/{}", field)));
        }
    }

    let amount = &fields["TRNAMT"];
    if Decimal::from_str(amount).is_err() {
        return Err(ValidationError::InvalidValue {
            tag: "TRNAMT".to_string(),
            value: amount.clone(),
        });
    }

    Ok(())
}
