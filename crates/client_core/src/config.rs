use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "todo.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub supabase_url: String,
    pub anon_key: String,
    pub tasks_table: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:54321".into(),
            anon_key: String::new(),
            tasks_table: "tasks".into(),
        }
    }
}

impl ClientSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.base_url()?;
        if self.anon_key.trim().is_empty() {
            bail!("anon key is not configured; set SUPABASE_ANON_KEY or anon_key in {DEFAULT_CONFIG_FILE}");
        }
        if self.tasks_table.trim().is_empty() {
            bail!("tasks table name must not be empty");
        }
        Ok(())
    }

    /// Project URL with a trailing slash so relative endpoint paths join under it.
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let raw = self.supabase_url.trim();
        let with_slash = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Url::parse(&with_slash)
            .with_context(|| format!("invalid backend url '{}'", self.supabase_url))
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE))
}

/// Defaults, then the optional config file, then the environment.
pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            if let Err(err) = apply_file_overrides(&mut settings, &raw) {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config file");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read config file");
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_file_overrides(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("supabase_url") {
        settings.supabase_url = v.clone();
    }
    if let Some(v) = file_cfg.get("anon_key") {
        settings.anon_key = v.clone();
    }
    if let Some(v) = file_cfg.get("tasks_table") {
        settings.tasks_table = v.clone();
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SUPABASE_URL") {
        settings.supabase_url = v;
    }
    if let Some(v) = lookup("APP__SUPABASE_URL") {
        settings.supabase_url = v;
    }

    if let Some(v) = lookup("SUPABASE_ANON_KEY") {
        settings.anon_key = v;
    }
    if let Some(v) = lookup("APP__SUPABASE_ANON_KEY") {
        settings.anon_key = v;
    }

    if let Some(v) = lookup("APP__TASKS_TABLE") {
        settings.tasks_table = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
