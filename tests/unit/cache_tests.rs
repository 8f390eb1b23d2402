/*!
 * Tests for the persistent translation cache
 */

use std::fs;

use alipay2ofx::translation::cache::TranslationCache;
use crate::common;

#[test]
fn test_open_withMissingFile_shouldStartEmpty() {
    let dir = common::create_temp_dir().unwrap();
    let cache = TranslationCache::open(dir.path().join("translations.txt")).unwrap();

    assert!(cache.is_empty());
    assert!(!dir.path().join("translations.txt").exists());
}

#[test]
fn test_store_shouldAppendLineImmediately() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.txt");
    let mut cache = TranslationCache::open(&path).unwrap();

    cache.store("星巴克", "Starbucks").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "星巴克|Starbucks\n");

    cache.store("拿铁咖啡", "Latte").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "星巴克|Starbucks\n拿铁咖啡|Latte\n");
}

#[test]
fn test_open_afterStore_shouldReloadEntries() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.txt");

    {
        let mut cache = TranslationCache::open(&path).unwrap();
        cache.store("午餐", "Lunch").unwrap();
        cache.store("a|b", "pipe\nnewline").unwrap();
    }

    let mut reopened = TranslationCache::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.lookup("午餐"), Some("Lunch".to_string()));
    assert_eq!(reopened.lookup("a|b"), Some("pipe\nnewline".to_string()));
}

#[test]
fn test_open_withHandEditedFile_shouldSkipBadLinesAndAppendSafely() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "translations.txt",
        "美团外卖|Meituan Delivery\n\nthis line has no separator\n转账|Transfer",
    )
    .unwrap();

    let mut cache = TranslationCache::open(&path).unwrap();
    assert_eq!(cache.len(), 2);

    cache.store("张三", "Zhang San").unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.ends_with("转账|Transfer\n张三|Zhang San\n"));
}

#[test]
fn test_lookup_shouldCountHitsAndMisses() {
    let mut cache = TranslationCache::in_memory();
    cache.store("茶", "Tea").unwrap();

    assert_eq!(cache.lookup("茶"), Some("Tea".to_string()));
    assert_eq!(cache.lookup("咖啡"), None);

    let (hits, misses, rate) = cache.stats();
    assert_eq!((hits, misses), (1, 1));
    assert!((rate - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_store_withSameTranslation_shouldNotDuplicateLine() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.txt");
    let mut cache = TranslationCache::open(&path).unwrap();

    cache.store("茶", "Tea").unwrap();
    cache.store("茶", "Tea").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
}

#[test]
fn test_inMemory_shouldHaveNoPath() {
    assert!(TranslationCache::in_memory().path().is_none());
}

#[test]
fn test_open_afterStoreWithCarriageReturns_shouldReloadSameKey() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.txt");

    {
        let mut cache = TranslationCache::open(&path).unwrap();
        cache.store("第一行\r\n第二行", "line one\r\nline two").unwrap();
    }
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

    let mut reopened = TranslationCache::open(&path).unwrap();
    assert_eq!(reopened.lookup("第一行\r\n第二行"), Some("line one\r\nline two".to_string()));
}

#[test]
fn test_open_withNonUtf8Line_shouldSkipItAndKeepTheRest() {
    common::init_test_logger();
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("translations.txt");
    let mut content = b"\xc0\xe4|Latte\n".to_vec();
    content.extend_from_slice("午餐|Lunch\n".as_bytes());
    fs::write(&path, &content).unwrap();

    let mut cache = TranslationCache::open(&path).unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.lookup("午餐"), Some("Lunch".to_string()));
}
