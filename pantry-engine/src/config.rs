//! 引擎配置 — 订餐/公告引擎的所有配置项
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | PANTRY_DATA_DIR | /var/lib/pantry | 数据目录 (redb 文件) |
//! | PANTRY_TZ | Europe/Madrid | 业务时区 (时段判定、日期键) |
//! | PANTRY_TXN_ATTEMPTS | 5 | 事务冲突重试次数上限 |
//!
//! # 示例
//!
//! ```ignore
//! PANTRY_DATA_DIR=/data/pantry PANTRY_TZ=Asia/Shanghai cargo run
//! ```

use chrono_tz::Tz;

/// 引擎配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 数据目录，存放 redb 数据库文件
    pub data_dir: String,
    /// 业务时区：时段边界与日期键都在此时区下计算
    pub timezone: Tz,
    /// 事务冲突重试次数上限 (最少 1)
    pub txn_attempts: u32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let timezone = std::env::var("PANTRY_TZ")
            .ok()
            .and_then(|tz| match tz.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    tracing::warn!(value = %tz, "Invalid PANTRY_TZ, falling back to Europe/Madrid");
                    None
                }
            })
            .unwrap_or(chrono_tz::Europe::Madrid);

        Self {
            data_dir: std::env::var("PANTRY_DATA_DIR").unwrap_or_else(|_| "/var/lib/pantry".into()),
            timezone,
            txn_attempts: std::env::var("PANTRY_TXN_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(data_dir: impl Into<String>, timezone: Tz) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config.timezone = timezone;
        config
    }
}
