use chrono::{DateTime, Local};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 索引文件中扫描时间戳的格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 当前本地时间的扫描时间戳
pub fn scan_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// 格式化时间为友好显示格式
pub fn format_time(time: SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(duration) => {
            if let Some(datetime) = DateTime::from_timestamp(duration.as_secs() as i64, 0) {
                let local_time = datetime.with_timezone(&Local);
                local_time.format(TIMESTAMP_FORMAT).to_string()
            } else {
                "未知时间".to_string()
            }
        }
        Err(_) => "未知时间".to_string(),
    }
}

/// 每秒处理的数量
pub fn per_second(count: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}
