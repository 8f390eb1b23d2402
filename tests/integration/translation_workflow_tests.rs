/*!
 * End-to-end conversion tests with translation, using the mock provider
 */

use std::fs;

use alipay2ofx::app_controller::{ConversionOptions, Controller};
use alipay2ofx::ofx::validate_ofx;
use alipay2ofx::providers::mock::MockProvider;
use alipay2ofx::translation::{TranslationCache, Translator};
use crate::common;

fn english(text: &str, _target: &str) -> String {
    match text {
        "星巴克" => "Starbucks".to_string(),
        "拿铁咖啡" => "Latte".to_string(),
        "张三" => "Zhang San".to_string(),
        "转账" => "Transfer".to_string(),
        "美团外卖" => "Meituan Delivery".to_string(),
        "午餐" => "Lunch".to_string(),
        other => other.to_string(),
    }
}

fn translate_options() -> ConversionOptions {
    ConversionOptions {
        translate: true,
        ..ConversionOptions::default()
    }
}

fn mock_translator(cache_path: &std::path::Path, provider: &MockProvider) -> Translator {
    let cache = TranslationCache::open(cache_path).unwrap();
    Translator::new("en", cache, Some(Box::new(provider.clone())))
}

#[tokio::test]
async fn test_run_withTranslation_shouldRenderTranslationWithSource() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");
    let cache_path = dir.path().join("translations.txt");

    let provider = MockProvider::working().with_custom_response(english);
    let mut translator = mock_translator(&cache_path, &provider);

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let report = controller
        .run_with_translator(&input, &output, &translate_options(), &mut translator)
        .await
        .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("<NAME>Starbucks (星巴克)</NAME>"));
    assert!(text.contains("<MEMO>Latte (拿铁咖啡)</MEMO>"));
    assert_eq!(validate_ofx(&text).unwrap().transaction_count, 3);

    assert_eq!(provider.request_count(), 6);
    assert_eq!(report.translation.remote_calls, 6);
    assert_eq!(fs::read_to_string(&cache_path).unwrap().lines().count(), 6);
}

#[tokio::test]
async fn test_run_withWarmCache_shouldNotCallProviderAndMatchFirstRun() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let first = dir.path().join("first.ofx");
    let second = dir.path().join("second.ofx");
    let cache_path = dir.path().join("translations.txt");
    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();

    let provider = MockProvider::working().with_custom_response(english);
    let mut translator = mock_translator(&cache_path, &provider);
    controller.run_with_translator(&input, &first, &translate_options(), &mut translator).await.unwrap();

    // A fresh translator reloads the cache file written by the first run
    let second_provider = MockProvider::working().with_custom_response(english);
    let mut translator = mock_translator(&cache_path, &second_provider);
    let report = controller
        .run_with_translator(&input, &second, &translate_options(), &mut translator)
        .await
        .unwrap();

    assert_eq!(second_provider.request_count(), 0);
    assert_eq!(report.translation.cache_hits, 6);
    assert_eq!(fs::read_to_string(&first).unwrap(), fs::read_to_string(&second).unwrap());
}

#[tokio::test]
async fn test_run_withHandEditedCache_shouldUseCorrectedTranslation() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");
    let cache_path = common::create_test_file(dir.path(), "translations.txt", "星巴克|Starbucks Coffee\n").unwrap();

    let provider = MockProvider::working().with_custom_response(english);
    let mut translator = mock_translator(&cache_path, &provider);

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    controller.run_with_translator(&input, &output, &translate_options(), &mut translator).await.unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("<NAME>Starbucks Coffee (星巴克)</NAME>"));
    assert_eq!(provider.request_count(), 5);
}

#[tokio::test]
async fn test_run_withFailingProvider_shouldFallBackToSourceText() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");

    let provider = MockProvider::failing();
    let mut translator = mock_translator(&dir.path().join("translations.txt"), &provider);

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let report = controller
        .run_with_translator(&input, &output, &translate_options(), &mut translator)
        .await
        .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("<NAME>星巴克</NAME>"));
    assert_eq!(report.written, 3);
    assert_eq!(report.translation.failures, 6);
    assert!(!dir.path().join("translations.txt").exists());
}

#[tokio::test]
async fn test_run_withRejectedApiKey_shouldStopAfterFirstRequest() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");

    let provider = MockProvider::unauthorized();
    let mut translator = mock_translator(&dir.path().join("translations.txt"), &provider);

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let report = controller
        .run_with_translator(&input, &output, &translate_options(), &mut translator)
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 1);
    assert_eq!(report.written, 3);
}

#[tokio::test]
async fn test_run_withTranslateButNoApiKey_shouldUseCacheOnly() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");
    common::create_test_file(dir.path(), "translations.txt", "午餐|Lunch\n").unwrap();

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let report = controller.run(&input, &output, &translate_options()).await.unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("<MEMO>Lunch (午餐)</MEMO>"));
    assert!(text.contains("<MEMO>拿铁咖啡</MEMO>"));
    assert_eq!(report.translation.remote_calls, 0);
    assert_eq!(report.translation.cache_hits, 1);
}

#[tokio::test]
async fn test_run_withNonUtf8CacheFile_shouldStillWriteOutput() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");
    let mut content = b"\xc0\xe4|Latte\n".to_vec();
    content.extend_from_slice("午餐|Lunch\n".as_bytes());
    fs::write(dir.path().join("translations.txt"), &content).unwrap();

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let report = controller.run(&input, &output, &translate_options()).await.unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(validate_ofx(&text).unwrap().transaction_count, 3);
    assert!(text.contains("<MEMO>Lunch (午餐)</MEMO>"));
    assert_eq!(report.written, 3);
}

#[tokio::test]
async fn test_run_withUnreadableCacheFile_shouldFallBackToEmptyCache() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_statement(dir.path(), "alipay.txt").unwrap();
    let output = dir.path().join("statement.ofx");
    // A directory in place of the cache file cannot be read
    fs::create_dir(dir.path().join("translations.txt")).unwrap();

    let controller = Controller::with_config(common::test_config(dir.path())).unwrap();
    let report = controller.run(&input, &output, &translate_options()).await.unwrap();

    assert_eq!(report.written, 3);
    assert_eq!(report.translation.cache_hits, 0);
    assert!(fs::read_to_string(&output).unwrap().contains("<NAME>星巴克</NAME>"));
}
