pub fn default_enabled() -> bool {
    true
}

/// One observation per day
pub fn default_period_seconds() -> u64 {
    86_400
}

/// Three months of daily observations
pub fn default_window_size() -> u64 {
    90
}

pub fn default_commit_phase_duration_seconds() -> u64 {
    3_600
}

pub fn default_price_decimals() -> u8 {
    8
}

pub fn default_poll_interval_seconds() -> u64 {
    60
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}
