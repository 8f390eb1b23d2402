use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::file_utils::FileManager;
use super::document::{OfxDocument, StatementTransaction};

// @module: OFX 1.02 SGML serialization

/// Header block preceding the SGML body
pub const OFX_HEADER: &[(&str, &str)] = &[
    ("OFXHEADER", "100"),
    ("DATA", "OFXSGML"),
    ("VERSION", "102"),
    ("SECURITY", "NONE"),
    ("ENCODING", "UTF-8"),
    ("CHARSET", "NONE"),
    ("COMPRESSION", "NONE"),
    ("OLDFILEUID", "NONE"),
    ("NEWFILEUID", "NONE"),
];

/// Posted date written for records without any timestamp
const EPOCH_DATETIME: &str = "19700101000000.000[+0:GMT]";

/// Escape text for an SGML element value
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' | '\n' | '\t' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

// @struct: Indenting tag emitter over a formatter
struct TagWriter<'a, 'b> {
    out: &'a mut fmt::Formatter<'b>,
    depth: usize,
}

impl<'a, 'b> TagWriter<'a, 'b> {
    fn indent(&mut self) -> fmt::Result {
        write!(self.out, "{:width$}", "", width = self.depth * 2)
    }

    fn open(&mut self, tag: &str) -> fmt::Result {
        self.indent()?;
        writeln!(self.out, "<{}>", tag)?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> fmt::Result {
        self.depth = self.depth.saturating_sub(1);
        self.indent()?;
        writeln!(self.out, "</{}>", tag)
    }

    fn element(&mut self, tag: &str, value: &str) -> fmt::Result {
        self.indent()?;
        writeln!(self.out, "<{}>{}</{}>", tag, escape_text(value), tag)
    }
}

impl fmt::Display for OfxDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in OFX_HEADER {
            writeln!(f, "{}:{}", key, value)?;
        }
        writeln!(f)?;

        let tz = &self.timezone;
        let signon = &self.signon;
        let stmt = &self.statement;
        let mut w = TagWriter { out: f, depth: 0 };

        w.open("OFX")?;

        w.open("SIGNONMSGSRSV1")?;
        w.open("SONRS")?;
        write_status(&mut w)?;
        w.element("DTSERVER", &tz.format(&signon.server_time))?;
        w.element("LANGUAGE", &signon.language)?;
        w.open("FI")?;
        w.element("ORG", &signon.org)?;
        w.element("FID", &signon.fid)?;
        w.close("FI")?;
        w.close("SONRS")?;
        w.close("SIGNONMSGSRSV1")?;

        w.open("BANKMSGSRSV1")?;
        w.open("STMTTRNRS")?;
        w.element("TRNUID", &stmt.transaction_uid)?;
        write_status(&mut w)?;
        w.open("STMTRS")?;
        w.element("CURDEF", &stmt.currency)?;
        w.open("BANKACCTFROM")?;
        w.element("BANKID", &stmt.bank_id)?;
        w.element("ACCTID", &stmt.account_id)?;
        w.element("ACCTTYPE", &stmt.account_type)?;
        w.close("BANKACCTFROM")?;

        w.open("BANKTRANLIST")?;
        w.element("DTSTART", &tz.format(&stmt.start))?;
        w.element("DTEND", &tz.format(&stmt.end))?;
        for transaction in &stmt.transactions {
            write_transaction(&mut w, transaction, |t| tz.format(t))?;
        }
        w.close("BANKTRANLIST")?;

        w.open("LEDGERBAL")?;
        w.element("BALAMT", &stmt.ledger_balance.to_string())?;
        w.element("DTASOF", &tz.format(&stmt.ledger_as_of))?;
        w.close("LEDGERBAL")?;

        w.close("STMTRS")?;
        w.close("STMTTRNRS")?;
        w.close("BANKMSGSRSV1")?;

        w.close("OFX")
    }
}

fn write_status(w: &mut TagWriter<'_, '_>) -> fmt::Result {
    w.open("STATUS")?;
    w.element("CODE", "0")?;
    w.element("SEVERITY", "INFO")?;
    w.close("STATUS")
}

fn write_transaction<F>(w: &mut TagWriter<'_, '_>, transaction: &StatementTransaction, format_time: F) -> fmt::Result
where
    F: Fn(&chrono::NaiveDateTime) -> String,
{
    let posted = transaction.posted
        .as_ref()
        .map(&format_time)
        .unwrap_or_else(|| EPOCH_DATETIME.to_string());

    w.open("STMTTRN")?;
    w.element("TRNTYPE", &transaction.transaction_type)?;
    w.element("DTPOSTED", &posted)?;
    w.element("TRNAMT", &transaction.amount.to_string())?;
    w.element("FITID", &transaction.fitid)?;
    w.element("NAME", &transaction.name)?;
    if let Some(memo) = &transaction.memo {
        w.element("MEMO", memo)?;
    }
    w.close("STMTTRN")
}

// @struct: Writes documents to streams and files
pub struct OfxWriter;

impl OfxWriter {
    /// Render the whole document as text
    pub fn render(document: &OfxDocument) -> String {
        document.to_string()
    }

    /// Write the document to any byte sink
    pub fn write_to<W: Write>(document: &OfxDocument, mut sink: W) -> Result<()> {
        sink.write_all(Self::render(document).as_bytes())
            .context("Failed to write OFX document")?;
        sink.flush().context("Failed to flush OFX document")?;
        Ok(())
    }

    /// Write the document to `path`, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(document: &OfxDocument, path: P) -> Result<()> {
        FileManager::write_to_file(path, &Self::render(document))
    }
}
