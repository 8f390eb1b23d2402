/*!
 * # alipay2ofx - Alipay statement to OFX converter
 *
 * A Rust library for turning Alipay transaction exports into OFX bank
 * statements that personal-finance tools can import.
 *
 * ## Features
 *
 * - Parse Alipay TXT/CSV exports (UTF-8 or GBK) including the statement preamble
 * - Skip malformed records with a warning instead of failing the run
 * - Optionally translate payee and memo texts with Google Cloud Translation
 * - Persistent, hand-editable translation cache shared between runs
 * - Deterministic transaction ids, so re-imports do not duplicate entries
 * - Structural validation of the written OFX document
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `statement`: Export parsing into typed records
 * - `translation`: Cache-first translation of statement texts:
 *   - `translation::cache`: The persistent translation cache
 * - `ofx`: Document model, SGML writer and validator
 * - `file_utils`: File system operations and statement decoding
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Translation service clients:
 *   - `providers::google`: Google Cloud Translation client
 *   - `providers::mock`: In-process provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod statement;
pub mod translation;
pub mod ofx;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{ConversionOptions, ConversionReport, Controller};
pub use statement::{Statement, StatementParser, TransactionRecord};
pub use translation::{TranslationCache, Translator};
pub use ofx::{validate_ofx, DocumentBuilder, OfxDocument, OfxWriter};
pub use errors::{ProviderError, RecordError, ValidationError};
