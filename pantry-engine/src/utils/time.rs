//! 时间工具函数 — 业务时区转换
//!
//! 所有日期→时间戳转换统一在这里完成，
//! 存储层只接收 `i64` Unix millis，日期键统一为 `YYYY-MM-DD`。

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 日期 → 日期键 (YYYY-MM-DD)
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 某个时刻在业务时区下的日历日期
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// 毫秒时间戳 → 业务时区时刻
///
/// 超出 chrono 可表示范围的时间戳返回 `None`（坏数据按"不在任何时段"处理）。
pub fn millis_to_local(millis: i64, tz: Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&tz))
}

/// 日期 + 时分 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
pub fn date_hm_to_millis(date: NaiveDate, hour: u32, min: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_opt(hour, min, 0).unwrap();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hm_to_millis(date, 0, 0, tz)
}

/// 以某天为终点的最近 n 个日期（从旧到新，含当天）
pub fn last_n_dates(today: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n as i64)
        .rev()
        .filter_map(|back| today.checked_sub_days(chrono::Days::new(back as u64)))
        .collect()
}
