// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fieldcost_app::{DEFAULT_AREA_UNIT, DEFAULT_CURRENCY_SYMBOL, MoneyFormat};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "fieldcost";
pub const CONFIG_PATH_ENV: &str = "FIELDCOST_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "fieldcost.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub sheet: Sheet,
    #[serde(default)]
    pub display: DisplayFormat,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sheet: Sheet::default(),
            display: DisplayFormat::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sheet {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayFormat {
    pub currency_symbol: Option<String>,
    pub area_unit: Option<String>,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            currency_symbol: Some(DEFAULT_CURRENCY_SYMBOL.to_owned()),
            area_unit: Some(DEFAULT_AREA_UNIT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub start_in_edit_mode: Option<bool>,
    pub allow_delete: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            start_in_edit_mode: Some(true),
            allow_delete: Some(true),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no `version`. Add `version = 1` at the top; settings live under [sheet], [display], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(sheet_path) = &self.sheet.path
            && sheet_path.trim().is_empty()
        {
            bail!(
                "sheet.path in {} is empty; remove it or point it at a sheet TOML file",
                path.display()
            );
        }

        if let Some(symbol) = &self.display.currency_symbol
            && symbol.trim().is_empty()
        {
            bail!(
                "display.currency_symbol in {} must not be empty (for example \"£\")",
                path.display()
            );
        }

        if let Some(unit) = &self.display.area_unit
            && unit.trim().is_empty()
        {
            bail!(
                "display.area_unit in {} must not be empty (for example \"ha\")",
                path.display()
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "log.level {level:?} in {} is not a valid filter ({error}); use trace, debug, info, warn, or error",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn sheet_path(&self) -> Option<PathBuf> {
        self.sheet.path.as_deref().map(PathBuf::from)
    }

    pub fn money_format(&self) -> MoneyFormat {
        MoneyFormat {
            currency_symbol: self
                .display
                .currency_symbol
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_owned()),
            area_unit: self
                .display
                .area_unit
                .clone()
                .unwrap_or_else(|| DEFAULT_AREA_UNIT.to_owned()),
        }
    }

    pub fn start_in_edit_mode(&self) -> bool {
        self.ui.start_in_edit_mode.unwrap_or(true)
    }

    pub fn allow_delete(&self) -> bool {
        self.ui.allow_delete.unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve local data directory; set [log].file in the config")
        })?;
        Ok(data_root.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# fieldcost config\n# Place this file at: {}\n\nversion = 1\n\n[sheet]\n# Cost sheet to open when --sheet is not given.\n# path = \"/absolute/path/to/sheet.toml\"\n\n[display]\ncurrency_symbol = \"{}\"\narea_unit = \"{}\"\n\n[ui]\nstart_in_edit_mode = true\nallow_delete = true\n\n[log]\n# FIELDCOST_LOG overrides this filter.\nlevel = \"{}\"\n# Default is the platform data dir (for example ~/.local/share/fieldcost/fieldcost.log)\n# file = \"/absolute/path/to/fieldcost.log\"\n",
            path.display(),
            DEFAULT_CURRENCY_SYMBOL,
            DEFAULT_AREA_UNIT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.sheet_path(), None);
        assert_eq!(config.money_format().rate(120.0), "£120.00/ha");
        assert!(config.start_in_edit_mode());
        assert!(config.allow_delete());
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[sheet]\npath = \"/farm/north.toml\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[sheet], [display], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[sheet]\npath = \"/farm/north.toml\"\n[display]\ncurrency_symbol = \"€\"\narea_unit = \"acre\"\n[ui]\nstart_in_edit_mode = false\nallow_delete = false\n[log]\nlevel = \"debug\"\nfile = \"/tmp/fieldcost-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.sheet_path(), Some(PathBuf::from("/farm/north.toml")));
        assert_eq!(config.money_format().rate(12.5), "€12.50/acre");
        assert!(!config.start_in_edit_mode());
        assert!(!config.allow_delete());
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_file()?, PathBuf::from("/tmp/fieldcost-test.log"));
        Ok(())
    }

    #[test]
    fn partial_display_section_falls_back_per_field() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[display]\narea_unit = \"acre\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.money_format().rate(3.0), "£3.00/acre");
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn empty_values_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[display]\ncurrency_symbol = \" \"\n")?;
        let error = Config::load(&path).expect_err("blank symbol should fail");
        assert!(error.to_string().contains("display.currency_symbol"));

        let (_temp, path) = write_config("version = 1\n[sheet]\npath = \"\"\n")?;
        let error = Config::load(&path).expect_err("blank sheet path should fail");
        assert!(error.to_string().contains("sheet.path"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"loud=[\"\n")?;
        let error = Config::load(&path).expect_err("bad level should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn log_file_defaults_under_data_dir() -> Result<()> {
        let config = Config::default();
        let path = config.log_file()?;
        assert!(path.ends_with("fieldcost/fieldcost.log"));
        Ok(())
    }

    #[test]
    fn example_config_loads_cleanly() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert_eq!(config.version, 1);
        assert_eq!(config.sheet_path(), None);
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("fieldcost/config.toml"));
        Ok(())
    }
}
