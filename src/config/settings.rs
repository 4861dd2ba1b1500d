// Configuration structs

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::constants::*;
use crate::matrix::RowMapping;
use crate::scheduling::{FiringPolicy, ScheduleConfig};
use crate::selection::{GridSelectors, SelectionConfig};
use crate::workflow::{PageSelectors, WaitConfig, WorkflowSettings};

/// `[account]` login credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,
}

/// `[companion]` identity entered on the checkout page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Comma-separated `HH:MM` list
    pub times: String,
    pub retry_delay_secs: u64,
    pub inter_task_delay_secs: u64,
    /// Skip a task's second attempt once the first has booked
    pub stop_after_success: bool,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            times: DEFAULT_SCHEDULE_TIMES.to_string(),
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            inter_task_delay_secs: DEFAULT_INTER_TASK_DELAY_SECS,
            stop_after_success: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub url: String,
    pub navigation_timeout_secs: u64,
    pub login_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SITE_URL.to_string(),
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            login_timeout_secs: DEFAULT_LOGIN_TIMEOUT_SECS,
        }
    }
}

/// `[grid]`: cell selectors plus the optional `[grid.rows]` label table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(flatten)]
    pub selectors: GridSelectors,
    #[serde(default)]
    pub rows: RowMapping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// chromedriver / geckodriver base URL
    pub endpoint: String,
    pub headless: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: false,
        }
    }
}

/// `[paths]`; unset directories resolve under `~/.courtbook`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub matrix: PathBuf,
    pub journal_dir: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,
    pub pid_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            matrix: PathBuf::from(DEFAULT_MATRIX_FILE),
            journal_dir: None,
            screenshot_dir: None,
            pid_file: None,
        }
    }
}

/// Feature flags configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Enable debug logging for troubleshooting
    #[serde(default)]
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub account: AccountConfig,
    pub companion: CompanionConfig,
    pub schedule: ScheduleSection,
    pub site: SiteConfig,
    pub wait: WaitConfig,
    pub selection: SelectionConfig,
    pub selectors: PageSelectors,
    pub grid: GridConfig,
    pub webdriver: WebDriverConfig,
    pub paths: PathsConfig,
    pub features: FeaturesConfig,
}

impl Config {
    /// `~/.courtbook`
    pub fn home_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .context("Could not determine home directory")?
            .join(CONFIG_DIR))
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value;
            }
        };

        set(&mut self.account.username, ENV_USERNAME);
        set(&mut self.account.password, ENV_PASSWORD);
        set(&mut self.companion.name, ENV_COMPANION_NAME);
        set(&mut self.companion.phone, ENV_COMPANION_PHONE);
        set(&mut self.schedule.times, ENV_SCHEDULE_TIME);
    }

    /// Checks every command depends on
    pub fn validate(&self) -> anyhow::Result<()> {
        self.wait.to_policy()?;

        let selection = &self.selection;
        if selection.start_column == 0 {
            bail!("[selection] start_column is 1-based; got 0");
        }
        if selection.start_column > selection.max_columns {
            bail!(
                "[selection] start_column ({}) is past max_columns ({})",
                selection.start_column,
                selection.max_columns
            );
        }

        if self.site.url.trim().is_empty() {
            bail!("[site] url is empty");
        }
        Ok(())
    }

    /// Additional checks before anything is booked
    pub fn validate_for_booking(&self) -> anyhow::Result<()> {
        self.validate()?;

        if self.account.username.trim().is_empty() || self.account.password.is_empty() {
            bail!(
                "Login credentials missing.\n\n\
                 Set them in ~/{}/{}:\n  \
                 [account]\n  username = \"...\"\n  password = \"...\"\n\n\
                 or export {} and {}",
                CONFIG_DIR,
                CONFIG_FILE,
                ENV_USERNAME,
                ENV_PASSWORD
            );
        }
        if self.companion.name.trim().is_empty() || self.companion.phone.trim().is_empty() {
            bail!(
                "Companion name and phone are required ([companion] or {} / {})",
                ENV_COMPANION_NAME,
                ENV_COMPANION_PHONE
            );
        }

        self.schedule_config()?;
        Ok(())
    }

    pub fn schedule_config(&self) -> anyhow::Result<ScheduleConfig> {
        ScheduleConfig::parse_list(&self.schedule.times).context("Invalid [schedule] times")
    }

    pub fn firing_policy(&self) -> FiringPolicy {
        FiringPolicy {
            retry_delay: Duration::from_secs(self.schedule.retry_delay_secs),
            inter_task_delay: Duration::from_secs(self.schedule.inter_task_delay_secs),
            stop_after_success: self.schedule.stop_after_success,
        }
    }

    pub fn workflow_settings(&self) -> anyhow::Result<WorkflowSettings> {
        Ok(WorkflowSettings {
            url: self.site.url.clone(),
            navigation_timeout: Duration::from_secs(self.site.navigation_timeout_secs),
            login_timeout: Duration::from_secs(self.site.login_timeout_secs),
            username: self.account.username.clone(),
            password: self.account.password.clone(),
            companion_name: self.companion.name.clone(),
            companion_phone: self.companion.phone.clone(),
            pages: self.selectors.clone(),
            grid: self.grid.selectors.clone(),
            selection: self.selection.clone(),
            wait: self.wait.to_policy()?,
            screenshot_dir: self.paths.screenshot_dir.clone(),
        })
    }

    pub fn journal_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.paths.journal_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::home_dir()?.join(JOURNAL_DIR)),
        }
    }

    pub fn pid_file(&self) -> anyhow::Result<PathBuf> {
        match &self.paths.pid_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join(PID_FILE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::WaitPolicy;
    use std::collections::HashMap;

    fn booking_config() -> Config {
        let mut config = Config::default();
        config.account.username = "2023001".into();
        config.account.password = "secret".into();
        config.companion.name = "Li".into();
        config.companion.phone = "13800000000".into();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.schedule.times, "05:00");
        assert_eq!(config.site.url, DEFAULT_SITE_URL);
        assert_eq!(config.webdriver.endpoint, "http://localhost:9515");
        assert!(!config.features.debug_logging);
        assert!(config.grid.rows.is_identity());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [account]
            username = "2023001"
            password = "pw"

            [companion]
            name = "Li"
            phone = "138"

            [schedule]
            times = "07:00, 09:00"
            retry_delay_secs = 3

            [wait]
            policy = "fixed"
            delay_ms = 800

            [selection]
            max_columns = 10

            [selectors]
            branch = "text=朝晖校区"

            [grid]
            booked_marker = ".taken"

            [grid.rows]
            "17:00-18:00" = 10
            "18:00-19:00" = 11

            [webdriver]
            headless = true

            [paths]
            matrix = "/srv/courtbook/matrix.csv"
            screenshot_dir = "/tmp/shots"

            [features]
            debug_logging = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate_for_booking().unwrap();

        assert_eq!(config.schedule.retry_delay_secs, 3);
        assert_eq!(config.schedule.inter_task_delay_secs, 1);
        assert_eq!(config.selection.max_columns, 10);
        assert_eq!(config.selection.start_column, 1);
        assert_eq!(config.selectors.branch, "text=朝晖校区");
        assert_eq!(config.selectors.agree, PageSelectors::default().agree);
        assert_eq!(config.grid.selectors.booked_marker, ".taken");
        assert_eq!(config.grid.selectors.free_marker, GridSelectors::default().free_marker);
        assert_eq!(config.grid.rows.grid_row("18:00-19:00"), Some(11));
        assert!(config.webdriver.headless);
        assert!(config.features.debug_logging);

        let settings = config.workflow_settings().unwrap();
        assert_eq!(settings.wait, WaitPolicy::FixedDelay(Duration::from_millis(800)));
        assert_eq!(settings.screenshot_dir, Some(PathBuf::from("/tmp/shots")));
        assert_eq!(config.firing_policy().retry_delay, Duration::from_secs(3));
        assert!(!config.firing_policy().stop_after_success);
        assert_eq!(config.schedule_config().unwrap().to_string(), "07:00, 09:00");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = booking_config();
        let env: HashMap<&str, &str> = [
            ("LOGIN_USERNAME", "from-env"),
            ("SCHEDULE_TIME", "06:30"),
            ("PASSWORD", "  "),
        ]
        .into_iter()
        .collect();

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.account.username, "from-env");
        assert_eq!(config.account.password, "secret");
        assert_eq!(config.schedule.times, "06:30");
        assert_eq!(config.companion.name, "Li");
    }

    #[test]
    fn test_missing_credentials_rejected_for_booking() {
        let config = Config::default();
        config.validate().unwrap();
        let err = config.validate_for_booking().unwrap_err();
        assert!(err.to_string().contains("LOGIN_USERNAME"));
    }

    #[test]
    fn test_unknown_wait_policy_rejected() {
        let mut config = booking_config();
        config.wait.policy = "sometimes".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_malformed_times_rejected_for_booking() {
        let mut config = booking_config();
        config.schedule.times = "25:00,noon".into();
        assert!(config.validate_for_booking().is_err());

        config.schedule.times = String::new();
        config.validate_for_booking().unwrap();
    }

    #[test]
    fn test_selection_bounds_checked() {
        let mut config = booking_config();
        config.selection.start_column = 0;
        assert!(config.validate().is_err());

        config.selection.start_column = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stop_after_success_is_opt_in() {
        let config: Config = toml::from_str("[schedule]\nstop_after_success = true\n").unwrap();
        assert!(config.firing_policy().stop_after_success);
        assert_eq!(config.schedule.times, DEFAULT_SCHEDULE_TIMES);
    }

    #[test]
    fn test_explicit_paths_win() {
        let mut config = Config::default();
        config.paths.journal_dir = Some(PathBuf::from("/var/log/courtbook"));
        config.paths.pid_file = Some(PathBuf::from("/run/courtbook.pid"));
        assert_eq!(config.journal_dir().unwrap(), PathBuf::from("/var/log/courtbook"));
        assert_eq!(config.pid_file().unwrap(), PathBuf::from("/run/courtbook.pid"));
    }
}
