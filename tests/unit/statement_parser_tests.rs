/*!
 * Tests for statement export parsing
 */

use chrono::NaiveDate;
use rust_decimal::Decimal;

use alipay2ofx::errors::RecordError;
use alipay2ofx::statement::{Direction, StatementParser, UNKNOWN_COUNTERPARTY};
use crate::common::{self, SAMPLE_STATEMENT};

#[test]
fn test_parse_withSampleStatement_shouldReadAllRecordsInOrder() {
    let statement = StatementParser::new(SAMPLE_STATEMENT).parse();

    assert_eq!(statement.records.len(), 3);
    assert_eq!(statement.skipped, 0);

    let trade_numbers: Vec<&str> = statement.records.iter().map(|r| r.trade_no.as_str()).collect();
    assert_eq!(trade_numbers, vec!["2024030222001001", "2024030522001002", "2024031022001003"]);

    let first = &statement.records[0];
    assert_eq!(first.counterparty, "星巴克");
    assert_eq!(first.item_name, "拿铁咖啡");
    assert_eq!(first.amount, Decimal::new(5800, 2));
    assert_eq!(first.direction, Direction::Debit);
    assert_eq!(first.currency, "CNY");
    assert_eq!(first.line, 6);

    assert_eq!(statement.records[1].direction, Direction::Credit);
    assert_eq!(statement.records[1].merchant_order_no, "");
}

#[test]
fn test_metadata_withSampleStatement_shouldReadPreambleAndFooter() {
    let metadata = StatementParser::new(SAMPLE_STATEMENT).metadata();

    assert_eq!(metadata.account.as_deref(), Some("test@example.com"));
    assert_eq!(metadata.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(metadata.end_date, NaiveDate::from_ymd_opt(2024, 3, 31));
    assert_eq!(metadata.declared_records, Some(3));
    assert_eq!(metadata.total_income, Some(Decimal::new(10000, 2)));
    assert_eq!(metadata.total_expense, Some(Decimal::new(7050, 2)));
    assert_eq!(
        metadata.export_time,
        NaiveDate::from_ymd_opt(2024, 4, 1).and_then(|d| d.and_hms_opt(10, 0, 0))
    );
}

#[test]
fn test_parse_withMalformedRow_shouldSkipOnlyThatRow() {
    common::init_test_logger();
    let content = common::statement_with_malformed_row();
    let statement = StatementParser::new(&content).parse();

    assert_eq!(statement.records.len(), 3);
    assert_eq!(statement.skipped, 1);
}

#[test]
fn test_records_withMalformedRow_shouldReportLineNumber() {
    let content = common::statement_with_malformed_row();
    let errors: Vec<RecordError> = StatementParser::new(&content)
        .records()
        .filter_map(Result::err)
        .collect();

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], RecordError::InvalidDecimal { line: 7, field: "amount", .. }));
}

#[test]
fn test_records_calledTwice_shouldStartOver() {
    let parser = StatementParser::new(SAMPLE_STATEMENT);
    assert_eq!(parser.records().count(), 3);
    assert_eq!(parser.records().count(), 3);
}

#[test]
fn test_parse_withoutHeaderRow_shouldYieldNoRecords() {
    common::init_test_logger();
    let statement = StatementParser::new("账号:[someone]\n共0笔记录\n").parse();

    assert!(statement.records.is_empty());
    assert_eq!(statement.metadata.account.as_deref(), Some("someone"));
}

#[test]
fn test_parse_withEmptyCounterparty_shouldUsePlaceholder() {
    let content = SAMPLE_STATEMENT.replace(",张三 ,", ", ,");
    let statement = StatementParser::new(&content).parse();
    assert_eq!(statement.records[1].counterparty, UNKNOWN_COUNTERPARTY);
}

#[test]
fn test_withCurrency_shouldStampRecords() {
    let statement = StatementParser::new(SAMPLE_STATEMENT).with_currency("HKD").parse();
    assert!(statement.records.iter().all(|r| r.currency == "HKD"));
}

#[test]
fn test_postedAt_shouldSpanSampleDates() {
    let statement = StatementParser::new(SAMPLE_STATEMENT).parse();
    let posted: Vec<_> = statement.records.iter().filter_map(|r| r.posted_at()).collect();
    let start = *posted.iter().min().unwrap();
    let end = *posted.iter().max().unwrap();

    assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(9, 15, 5).unwrap());
    assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(12, 0, 4).unwrap());
}
