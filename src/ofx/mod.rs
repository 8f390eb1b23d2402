/*!
 * Open Financial Exchange output.
 *
 * - `document`: the statement model and its construction from records
 * - `writer`: OFX 1.02 SGML serialization
 * - `validate`: structural re-check of a written document
 */

pub mod document;
pub mod validate;
pub mod writer;

pub use document::{AccountInfo, DocumentBuilder, LocalizedRecord, OfxDocument, OfxTimezone};
pub use validate::{validate_ofx, OfxSummary};
pub use writer::OfxWriter;
