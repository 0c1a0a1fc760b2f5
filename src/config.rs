//! Persisted configuration store.
//!
//! A flat, human-editable `key=value` file (java-properties compatible subset)
//! at `.starship/starship-dev.properties`. Boolean build/clean flags live
//! here, durable across invocations; the config UI edits the same file.
//!
//! The store is loaded once per invocation into an in-memory working copy and
//! written back whole: write to a temp file in the same directory, then
//! rename over the target. Keys this tool does not know about round-trip
//! unchanged. Concurrent invocations against the same store are not
//! coordinated; callers must serialize.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::BuildError;

pub const STORE_FILE: &str = "starship-dev.properties";

/// Shipped defaults, materialized on first run.
const DEFAULT_TEMPLATE: &str = include_str!("../resources/starship-dev.properties");

const HEADER: &str = "Starship Development Updated Properties";

/// In-memory working copy of the flag store for one invocation.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl Store {
    /// Load the store from `<state_dir>/starship-dev.properties`.
    ///
    /// If the external file does not exist yet, the bundled default template
    /// is loaded instead and immediately materialized at the external path so
    /// subsequent runs (and the config UI) read the same file.
    pub fn load(state_dir: &Path) -> Result<Store, BuildError> {
        let path = state_dir.join(STORE_FILE);

        let (text, materialize) = match fs::read_to_string(&path) {
            Ok(text) => (text, false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no flag store at {}; using bundled defaults", path.display());
                (DEFAULT_TEMPLATE.to_string(), true)
            }
            Err(e) => {
                return Err(BuildError::StoreUnavailable(format!(
                    "{}: {e}",
                    path.display()
                )))
            }
        };

        let store = Store {
            path,
            entries: parse(&text),
        };
        debug!("flags: {:?}", store.keys().collect::<Vec<_>>());

        if materialize {
            store.save()?;
        }

        Ok(store)
    }

    /// Rewrite the whole file atomically (write-then-rename, never partial).
    pub fn save(&self) -> Result<(), BuildError> {
        let write_failed = |source| BuildError::StoreWriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_failed)?;
        }

        let mut out = String::new();
        out.push_str(&format!("# {HEADER}\n"));
        out.push_str(&format!("# {}\n", chrono::Utc::now().to_rfc3339()));
        for (key, value) in &self.entries {
            out.push_str(&format!("{key}={value}\n"));
        }

        let tmp = self.path.with_extension("properties.tmp");
        fs::write(&tmp, &out).map_err(write_failed)?;
        fs::rename(&tmp, &self.path).map_err(write_failed)?;

        debug!("stored {} keys at {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// Boolean flag lookup. Absent or non-`true` values read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Raw value lookup, for keys this tool does not interpret.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Parse the `key=value` subset of the java-properties format. Blank lines
/// and `#`/`!` comments are skipped; later duplicates win.
fn parse(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    entries
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store_in(dir: &Path, text: &str) -> Store {
        fs::write(dir.join(STORE_FILE), text).unwrap();
        Store::load(dir).unwrap()
    }

    #[test]
    fn absent_flags_default_to_false() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), "buildFiasco=true\n");
        assert!(store.flag("buildFiasco"));
        assert!(!store.flag("buildL4"));
        assert!(!store.flag("nonsense"));
    }

    #[test]
    fn missing_store_falls_back_to_template_and_materializes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::load(tmp.path()).unwrap();

        // Template defaults request the x86_64 core builds.
        assert!(store.flag("buildFiasco"));
        assert!(store.flag("buildFiasco.x86_64"));
        assert!(!store.flag("buildFiasco.ARM"));
        assert!(!store.flag("cleanFiasco"));

        // The template was written out at the expected external path.
        let on_disk = tmp.path().join(STORE_FILE);
        assert!(on_disk.is_file());
        let reloaded = Store::load(tmp.path()).unwrap();
        assert!(reloaded.flag("buildFiasco"));
    }

    #[test]
    fn save_load_round_trips_keys_and_values() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_in(
            tmp.path(),
            "buildFiasco=true\ncustom.unknown=keep-me\nbuildL4=false\n",
        );
        store.set_flag("cleanFiasco", true);
        store.save().unwrap();

        let reloaded = Store::load(tmp.path()).unwrap();
        assert_eq!(reloaded.get("custom.unknown"), Some("keep-me"));
        assert_eq!(reloaded.get("buildFiasco"), Some("true"));
        assert_eq!(reloaded.get("buildL4"), Some("false"));
        assert!(reloaded.flag("cleanFiasco"));
        assert_eq!(
            store.keys().collect::<Vec<_>>(),
            reloaded.keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(
            tmp.path(),
            "# header\n! alt comment\n\n  buildJDK = true \n",
        );
        assert!(store.flag("buildJDK"));
        assert_eq!(store.keys().count(), 1);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), "buildFiasco=true\n");
        store.save().unwrap();
        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
