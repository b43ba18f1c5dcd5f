use super::*;

use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file_overrides(
        &mut settings,
        r#"
supabase_url = "https://abc.supabase.co"
anon_key = "public-anon"
"#,
    )
    .expect("parse");

    assert_eq!(settings.supabase_url, "https://abc.supabase.co");
    assert_eq!(settings.anon_key, "public-anon");
    assert_eq!(settings.tasks_table, "tasks");
}

#[test]
fn prefixed_env_wins_over_plain_env() {
    let mut settings = ClientSettings::default();
    let env: HashMap<&str, &str> = [
        ("SUPABASE_URL", "https://plain.example"),
        ("APP__SUPABASE_URL", "https://prefixed.example"),
        ("SUPABASE_ANON_KEY", "k1"),
        ("APP__TASKS_TABLE", "todos"),
    ]
    .into_iter()
    .collect();

    apply_env_overrides(&mut settings, |name| env.get(name).map(|v| v.to_string()));

    assert_eq!(settings.supabase_url, "https://prefixed.example");
    assert_eq!(settings.anon_key, "k1");
    assert_eq!(settings.tasks_table, "todos");
}

#[test]
fn malformed_file_is_reported() {
    let mut settings = ClientSettings::default();
    assert!(apply_file_overrides(&mut settings, "supabase_url = [1, 2]").is_err());
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn base_url_gains_trailing_slash() {
    let settings = ClientSettings {
        supabase_url: "https://abc.supabase.co".into(),
        ..ClientSettings::default()
    };
    let url = settings.base_url().expect("url");
    assert_eq!(
        url.join("rest/v1/tasks").expect("join").as_str(),
        "https://abc.supabase.co/rest/v1/tasks"
    );
}

#[test]
fn validate_rejects_missing_key_and_bad_url() {
    let missing_key = ClientSettings::default();
    assert!(missing_key.validate().is_err());

    let bad_url = ClientSettings {
        supabase_url: "not a url".into(),
        anon_key: "k".into(),
        ..ClientSettings::default()
    };
    assert!(bad_url.validate().is_err());

    let ok = ClientSettings {
        anon_key: "k".into(),
        ..ClientSettings::default()
    };
    ok.validate().expect("valid settings");
}

#[test]
fn loads_settings_from_explicit_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("todo_client_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("todo.toml");
    fs::write(&path, "tasks_table = \"my_tasks\"\n").expect("write config");

    let settings = load_settings_from(&path);
    assert_eq!(settings.tasks_table, "my_tasks");

    fs::remove_dir_all(temp_root).expect("cleanup");
}
