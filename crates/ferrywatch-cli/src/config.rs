//! Configuration Vault – reads/writes `~/.ferrywatch/config.toml`.

use ferrywatch_types::{Coordinate, DEFAULT_RADIUS_M, Zone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One monitored terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius")]
    pub radius_m: f64,
}

impl From<&ZoneConfig> for Zone {
    fn from(z: &ZoneConfig) -> Self {
        Zone::new(z.name.clone(), Coordinate::new(z.lat, z.lon), z.radius_m)
    }
}

/// Persisted node configuration stored in `~/.ferrywatch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the rig server exposing `/ferry`, `/rtc`, `/arriving`, `/departing`.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Delay between two `/ferry` polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of vessels tracked per terminal.
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,

    /// Plain-text audit log.
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Optional SQLite audit log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,

    /// POST transitions to the rig server.
    #[serde(default = "default_true")]
    pub notify_http: bool,

    /// Align audit timestamps with the server's `/rtc` at startup.
    #[serde(default = "default_true")]
    pub sync_clock: bool,

    /// Terminals to watch. Each gets its own engine and registry.
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
}

fn default_server_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_registry_capacity() -> usize {
    ferrywatch_core::DEFAULT_CAPACITY
}
fn default_radius() -> f64 {
    DEFAULT_RADIUS_M
}
fn default_zones() -> Vec<ZoneConfig> {
    let uq = Zone::uq_terminal();
    vec![ZoneConfig {
        name: uq.name,
        lat: uq.center.lat,
        lon: uq.center.lon,
        radius_m: uq.radius_m,
    }]
}
fn default_log_path() -> String {
    "FERRYLOG.txt".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            poll_interval_ms: default_poll_interval_ms(),
            registry_capacity: default_registry_capacity(),
            log_path: default_log_path(),
            sqlite_path: None,
            notify_http: true,
            sync_clock: true,
            zones: default_zones(),
        }
    }
}

impl Config {
    /// Monitored terminals as engine zones.
    pub fn zones(&self) -> Vec<Zone> {
        self.zones.iter().map(Zone::from).collect()
    }
}

/// Return the path to `~/.ferrywatch/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".ferrywatch").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `FERRYWATCH_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FERRYWATCH_SERVER_URL` | `server_url` |
/// | `FERRYWATCH_POLL_MS` | `poll_interval_ms` |
/// | `FERRYWATCH_CAPACITY` | `registry_capacity` |
/// | `FERRYWATCH_LOG_PATH` | `log_path` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

/// Apply overrides from `lookup`, which maps a `FERRYWATCH_*` name to its value.
pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FERRYWATCH_SERVER_URL") {
        cfg.server_url = v;
    }
    if let Some(v) = lookup("FERRYWATCH_POLL_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.poll_interval_ms = ms;
    }
    if let Some(v) = lookup("FERRYWATCH_CAPACITY")
        && let Ok(n) = v.parse::<usize>()
    {
        cfg.registry_capacity = n;
    }
    if let Some(v) = lookup("FERRYWATCH_LOG_PATH") {
        cfg.log_path = v;
    }
}

/// First-run bootstrap: write the default config to `path`, then return it
/// with the overrides from `lookup` applied. Overrides are never persisted.
pub(crate) fn bootstrap_at(
    path: &PathBuf,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, String> {
    let mut cfg = Config::default();
    save_to(&cfg, path)?;
    apply_overrides(&mut cfg, lookup);
    Ok(cfg)
}

/// [`bootstrap_at`] for `~/.ferrywatch/config.toml` and the process environment.
pub fn bootstrap() -> Result<Config, String> {
    bootstrap_at(&config_path(), |key| std::env::var(key).ok())
}

/// Save the config to `path`, creating its directory if necessary.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_watches_uq_terminal_only() {
        let cfg = Config::default();
        let zones = cfg.zones();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0], Zone::uq_terminal());
        assert_eq!(cfg.registry_capacity, 4);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = Config::default();
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.zones, cfg.zones);
        assert!(loaded.notify_http);
        assert!(loaded.sync_clock);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let raw = r#"
            server_url = "http://10.0.0.2:8000"

            [[zones]]
            name = "Milton"
            lat = -27.473530974935436
            lon = 153.00563885557887
        "#;
        let cfg: Config = toml::from_str(raw).expect("parse");
        assert_eq!(cfg.server_url, "http://10.0.0.2:8000");
        assert_eq!(cfg.poll_interval_ms, 100);
        assert_eq!(cfg.zones.len(), 1);
        assert_eq!(cfg.zones[0].name, "Milton");
        assert!((cfg.zones[0].radius_m - 100.0).abs() < f64::EPSILON);
        assert!(cfg.sqlite_path.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");
    }

    #[test]
    fn config_path_points_to_ferrywatch_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".ferrywatch"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_change_server_url_and_log_path() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("FERRYWATCH_SERVER_URL", "http://rig-server:8000"),
                ("FERRYWATCH_LOG_PATH", "/var/log/ferry.txt"),
            ]),
        );
        assert_eq!(cfg.server_url, "http://rig-server:8000");
        assert_eq!(cfg.log_path, "/var/log/ferry.txt");
    }

    #[test]
    fn overrides_change_capacity() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, vars(&[("FERRYWATCH_CAPACITY", "8")]));
        assert_eq!(cfg.registry_capacity, 8);
    }

    #[test]
    fn overrides_ignore_invalid_poll_interval() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, vars(&[("FERRYWATCH_POLL_MS", "soon")]));
        assert_eq!(cfg.poll_interval_ms, 100);
    }

    #[test]
    fn no_overrides_leave_config_untouched() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, vars(&[]));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn bootstrap_writes_defaults_without_overrides() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let cfg = bootstrap_at(&path, vars(&[("FERRYWATCH_SERVER_URL", "http://rig-server:8000")]))
            .expect("bootstrap");
        assert_eq!(cfg.server_url, "http://rig-server:8000");

        let raw = std::fs::read_to_string(&path).expect("config written");
        let on_disk: Config = toml::from_str(&raw).expect("parse");
        assert_eq!(on_disk.server_url, default_server_url());
    }
}
