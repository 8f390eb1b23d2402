/*!
 * Common test utilities for the alipay2ofx test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use alipay2ofx::app_config::Config;

/// A three-record export as Alipay writes it, preamble and footer included
pub const SAMPLE_STATEMENT: &str = "支付宝交易记录明细查询
账号:[test@example.com]
起始日期:[2024-03-01 00:00:00]    终止日期:[2024-03-31 23:59:59]
---------------------------------交易记录明细列表------------------------------------
交易号,商户订单号,交易创建时间,付款时间,最近修改时间,交易来源地,类型,交易对方,商品名称,金额（元）,收/支,交易状态,服务费（元）,成功退款（元）,备注,资金状态,
2024030222001001  ,T20240302001  ,2024-03-02 09:15:00 ,2024-03-02 09:15:05 ,2024-03-02 09:15:05 ,支付宝网站 ,即时到账交易 ,星巴克 ,拿铁咖啡 ,58.00 ,支出 ,交易成功 ,0.00 ,0.00 , ,已支出 ,
2024030522001002  ,  ,2024-03-05 18:30:00 ,2024-03-05 18:30:02 ,2024-03-05 18:30:02 ,其他（包括阿里巴巴和外部商家） ,即时到账交易 ,张三 ,转账 ,100.00 ,收入 ,交易成功 ,0.00 ,0.00 , ,已收入 ,
2024031022001003  ,T20240310003  ,2024-03-10 12:00:00 ,2024-03-10 12:00:04 ,2024-03-10 12:00:04 ,支付宝网站 ,即时到账交易 ,美团外卖 ,午餐 ,12.50 ,支出 ,交易成功 ,0.00 ,0.00 , ,已支出 ,
------------------------------------------------------------------------------------
共3笔记录
已收入:1笔,100.00元
已支出:2笔,70.50元
导出时间:[2024-04-01 10:00:00]    用户:测试用户
";

/// Row with an amount that is not a number
pub const MALFORMED_ROW: &str = "2024030822001009  ,  ,2024-03-08 08:00:00 ,2024-03-08 08:00:01 ,2024-03-08 08:00:01 ,支付宝网站 ,即时到账交易 ,便利店 ,饮料 ,abc ,支出 ,交易成功 ,0.00 ,0.00 , ,已支出 ,";

/// The sample with a malformed row inserted between the first two records
pub fn statement_with_malformed_row() -> String {
    let mut lines: Vec<&str> = SAMPLE_STATEMENT.lines().collect();
    lines.insert(6, MALFORMED_ROW);
    lines.join("\n") + "\n"
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the sample statement in the specified directory
pub fn create_test_statement(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_STATEMENT)
}

/// Default configuration with the translation cache inside `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.translation.cache_file = dir.join("translations.txt").to_string_lossy().to_string();
    config
}

/// Route library logging through env_logger; repeated calls are ignored
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
