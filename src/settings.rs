use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

/// Env var pointing the binaries at a settings file.
pub const SETTINGS_ENV: &str = "VIEWPORT_RULER_SETTINGS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    pub node_binary: String,
    /// Directory holding `node_modules/typescript`.
    pub package_root: PathBuf,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            node_binary: "node".into(),
            package_root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    pub debounce_ms: u64,
}

impl WatchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self { debounce_ms: 20 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    compiler: CompilerSettings,
    watch: WatchSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    /// Loads `path`, falling back to defaults when it is missing or unparsable.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring invalid settings in {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Store at `$VIEWPORT_RULER_SETTINGS`, or `viewport-ruler.json` in the
    /// working directory.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("viewport-ruler.json"));
        Self::new(path)
    }

    pub fn compiler(&self) -> CompilerSettings {
        self.read().compiler.clone()
    }

    pub fn watch(&self) -> WatchSettings {
        self.read().watch.clone()
    }

    pub fn update_compiler(&self, settings: CompilerSettings) -> Result<()> {
        let mut guard = self.write();
        guard.compiler = settings;
        self.persist(&guard)
    }

    pub fn update_watch(&self, settings: WatchSettings) -> Result<()> {
        let mut guard = self.write();
        guard.watch = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        assert_eq!(store.compiler(), CompilerSettings::default());
        assert_eq!(store.watch().debounce(), Duration::from_millis(20));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"watch":{"debounce_ms":150}}"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.watch().debounce_ms, 150);
        assert_eq!(store.compiler().node_binary, "node");
    }

    #[test]
    fn invalid_file_falls_back_but_reload_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.watch(), WatchSettings::default());
        assert!(store.reload().is_err());
    }

    #[test]
    fn updates_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_compiler(CompilerSettings {
                node_binary: "/opt/node/bin/node".into(),
                package_root: PathBuf::from("/work/app"),
            })
            .unwrap();
        store.update_watch(WatchSettings { debounce_ms: 0 }).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.compiler().node_binary, "/opt/node/bin/node");
        assert_eq!(reopened.watch().debounce(), Duration::ZERO);

        store.update_watch(WatchSettings { debounce_ms: 75 }).unwrap();
        reopened.reload().unwrap();
        assert_eq!(reopened.watch().debounce_ms, 75);
    }
}
