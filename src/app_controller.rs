use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::ofx::{DocumentBuilder, LocalizedRecord, OfxDocument, OfxWriter};
use crate::providers::google::GoogleTranslate;
use crate::providers::Translate;
use crate::statement::{StatementParser, UNKNOWN_COUNTERPARTY};
use crate::translation::{TranslationCache, Translator, TranslatorStats};

// @module: Application controller for statement conversion

/// Per-run options that come from the command line
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Translate payee and memo texts
    pub translate: bool,
    /// Overrides the key from the configuration
    pub api_key: Option<String>,
    /// Overrides the account found in the export
    pub account_id: Option<String>,
    pub ledger_balance: Option<Decimal>,
    pub ledger_date: Option<NaiveDate>,
    /// Show a progress bar while translating
    pub show_progress: bool,
}

/// Outcome of one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    /// Transactions written to the output
    pub written: usize,
    /// Malformed records left out
    pub skipped: usize,
    pub translation: TranslatorStats,
}

/// Main application controller for statement conversion
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a controller, rejecting invalid configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the translator for a run: disabled unless requested, otherwise
    /// the persistent cache in front of Google when an API key is available
    pub fn build_translator(&self, options: &ConversionOptions) -> Result<Translator> {
        if !options.translate {
            return Ok(Translator::disabled());
        }

        let settings = &self.config.translation;
        let target_language = language_utils::normalize_target_language(&self.config.target_language)?;
        let cache = TranslationCache::open(&settings.cache_file).unwrap_or_else(|e| {
            warn!("{:#}; continuing without cached translations", e);
            TranslationCache::in_memory()
        });

        let api_key = options.api_key.clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| Some(settings.api_key.clone()).filter(|key| !key.trim().is_empty()));

        let provider: Option<Box<dyn Translate>> = api_key.map(|key| {
            Box::new(
                GoogleTranslate::new(key, settings.endpoint.clone(), settings.timeout_secs)
                    .with_retries(settings.retry_count, settings.retry_backoff_ms),
            ) as Box<dyn Translate>
        });

        match language_utils::get_language_name(&target_language) {
            Ok(name) => info!("Translating statement texts to {} ({})", name, target_language),
            Err(_) => info!("Translating statement texts to {}", target_language),
        }

        Ok(Translator::new(target_language, cache, provider).with_source_text(settings.append_source_text))
    }

    /// Convert `input` to `output` with a translator built from the configuration
    pub async fn run<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input: P1,
        output: P2,
        options: &ConversionOptions,
    ) -> Result<ConversionReport> {
        let mut translator = self.build_translator(options)?;
        self.run_with_translator(input, output, options, &mut translator).await
    }

    /// Convert `input` to `output` using the given translator
    pub async fn run_with_translator<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input: P1,
        output: P2,
        options: &ConversionOptions,
        translator: &mut Translator,
    ) -> Result<ConversionReport> {
        let start_time = Instant::now();
        let input = input.as_ref();
        let output: PathBuf = output.as_ref().to_path_buf();

        let content = FileManager::read_statement(input)?;
        let (document, skipped) = self.build_document(&content, options, translator).await;

        OfxWriter::write_to_file(&document, &output)
            .with_context(|| format!("Failed to write OFX output: {:?}", output))?;

        let report = ConversionReport {
            written: document.statement.transactions.len(),
            skipped,
            translation: translator.stats(),
        };

        info!(
            "Wrote {} transactions to {:?} ({} skipped) in {:.2?}",
            report.written,
            output,
            report.skipped,
            start_time.elapsed()
        );
        if translator.is_enabled() {
            info!(
                "Translations: {} from cache, {} requested, {} failed",
                report.translation.cache_hits, report.translation.remote_calls, report.translation.failures
            );
        }

        Ok(report)
    }

    /// Parse decoded statement text and assemble the document; returns the
    /// document and the number of records skipped as malformed
    pub async fn build_document(
        &self,
        content: &str,
        options: &ConversionOptions,
        translator: &mut Translator,
    ) -> (OfxDocument, usize) {
        let statement = StatementParser::new(content)
            .with_currency(self.config.account.currency.clone())
            .parse();

        if statement.records.is_empty() {
            warn!("No transactions found in the statement");
        }

        let entries = self.localize(statement.records, translator, options.show_progress).await;

        let mut account = self.config.account_info();
        account.account_id = options.account_id.clone();
        account.ledger_balance = options.ledger_balance;
        account.ledger_date = options.ledger_date;

        let document = DocumentBuilder::new(account).build(&statement.metadata, entries);
        (document, statement.skipped)
    }

    /// Attach payee and memo texts to each record, translated when enabled
    async fn localize(
        &self,
        records: Vec<crate::statement::TransactionRecord>,
        translator: &mut Translator,
        show_progress: bool,
    ) -> Vec<LocalizedRecord> {
        if !translator.is_enabled() {
            return records.into_iter().map(LocalizedRecord::untranslated).collect();
        }

        let progress_bar = if show_progress {
            ProgressBar::new(records.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let name = if record.counterparty == UNKNOWN_COUNTERPARTY {
                record.counterparty.clone()
            } else {
                translator.translate_field(&record.counterparty).await
            };
            let memo = translator.translate_field(&record.item_name).await;
            entries.push(LocalizedRecord { record, name, memo });
            progress_bar.inc(1);
        }

        progress_bar.finish_and_clear();
        debug!("Cache now holds {} translations", translator.cache().len());
        entries
    }
}
