// Project-wide constants
//
// Defaults for values that can also come from config.toml. Import via
// `use crate::config::constants::*;`.

/// Directory under $HOME holding config.toml, the journal and the PID file
pub const CONFIG_DIR: &str = ".courtbook";

pub const CONFIG_FILE: &str = "config.toml";

/// Reservation entry page of the venue site
pub const DEFAULT_SITE_URL: &str = "http://www.api.zgyy.zjut.edu.cn/h5/main/reservation";

pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 5;

/// Bound on the post-login landmark wait
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 10;

/// Comma-separated trigger list used when none is configured
pub const DEFAULT_SCHEDULE_TIMES: &str = "05:00";

pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

pub const DEFAULT_INTER_TASK_DELAY_SECS: u64 = 1;

/// chromedriver's default listen address
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

pub const DEFAULT_MATRIX_FILE: &str = "reservation.csv";

pub const PID_FILE: &str = "courtbook.pid";

pub const JOURNAL_DIR: &str = "journal";

/// Environment overrides, applied after the file
pub const ENV_USERNAME: &str = "LOGIN_USERNAME";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_COMPANION_NAME: &str = "COMPANION_NAME";
pub const ENV_COMPANION_PHONE: &str = "COMPANION_PHONE";
pub const ENV_SCHEDULE_TIME: &str = "SCHEDULE_TIME";
