/*!
 * Tests for file utilities
 */

use encoding_rs::GB18030;

use alipay2ofx::file_utils::{FileManager, SourceEncoding};
use alipay2ofx::statement::StatementParser;
use crate::common::{self, SAMPLE_STATEMENT};

#[test]
fn test_readStatement_withGbkExport_shouldParseLikeUtf8() {
    let dir = common::create_temp_dir().unwrap();
    let (bytes, _, _) = GB18030.encode(SAMPLE_STATEMENT);
    let path = dir.path().join("alipay_gbk.txt");
    std::fs::write(&path, &bytes).unwrap();

    let text = FileManager::read_statement(&path).unwrap();

    assert_eq!(text, SAMPLE_STATEMENT);
    assert_eq!(StatementParser::new(&text).parse().records.len(), 3);
}

#[test]
fn test_readStatement_withMissingFile_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    assert!(FileManager::read_statement(dir.path().join("missing.txt")).is_err());
}

#[test]
fn test_decodeStatement_withUtf8_shouldKeepText() {
    let (text, encoding) = FileManager::decode_statement(SAMPLE_STATEMENT.as_bytes());
    assert_eq!(text, SAMPLE_STATEMENT);
    assert_eq!(encoding, SourceEncoding::Utf8);
}

#[test]
fn test_ensureDir_shouldCreateNestedDirectories() {
    let dir = common::create_temp_dir().unwrap();
    let nested = dir.path().join("a/b/c");

    FileManager::ensure_dir(&nested).unwrap();
    FileManager::ensure_dir(&nested).unwrap();

    assert!(nested.is_dir());
}
