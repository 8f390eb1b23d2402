/*!
 * Provider implementations for remote translation services.
 *
 * This module contains client implementations behind a common trait:
 * - Google: Google Cloud Translation v2 API
 * - Mock: deterministic in-process provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translator.
#[async_trait]
pub trait Translate: Send + Sync + Debug {
    /// Translate a single text
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `target_language` - ISO 639-1 code of the language to translate into
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError>;

    /// Short provider name for log messages
    fn name(&self) -> &str;
}

pub mod google;
pub mod mock;
