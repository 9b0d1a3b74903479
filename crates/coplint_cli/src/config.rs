//! Configuration discovery.
//!
//! Every directory from the filesystem root down to a file's own directory
//! may hold a `.coplint.json` or `.coplint.jsonc`. Their layers apply
//! outermost first, then the file given with `--config`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use coplint_core::{ConfigError, ConfigLayer, ConfigSource};
use tracing::debug;

/// File names looked up in each directory, in order of preference.
pub const CONFIG_FILES: &[&str] = &[".coplint.json", ".coplint.jsonc"];

/// Layers from configuration files next to and above each inspected file.
#[derive(Debug, Default)]
pub struct DirectoryConfig {
    explicit: Option<ConfigLayer>,
    /// Directory to the layer found there, if any.
    found: Mutex<HashMap<PathBuf, Option<ConfigLayer>>>,
}

impl DirectoryConfig {
    pub fn new(explicit: Option<ConfigLayer>) -> Self {
        Self {
            explicit,
            found: Mutex::new(HashMap::new()),
        }
    }

    fn layer_in(&self, dir: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
        let mut found = self.found.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(layer) = found.get(dir) {
            return Ok(layer.clone());
        }

        let layer = match CONFIG_FILES.iter().map(|name| dir.join(name)).find(|p| p.is_file()) {
            Some(path) => {
                debug!("Using config: {}", path.display());
                Some(ConfigLayer::from_file(&path)?)
            }
            None => None,
        };
        found.insert(dir.to_path_buf(), layer.clone());
        Ok(layer)
    }
}

impl ConfigSource for DirectoryConfig {
    fn layers_for(&self, path: &Path) -> Result<Vec<ConfigLayer>, ConfigError> {
        let dirs: Vec<&Path> = path.ancestors().skip(1).collect();
        let mut layers = Vec::new();
        for dir in dirs.into_iter().rev() {
            if let Some(layer) = self.layer_in(dir)? {
                layers.push(layer);
            }
        }
        layers.extend(self.explicit.iter().cloned());
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn sources(layers: &[ConfigLayer]) -> Vec<String> {
        layers.iter().map(|l| l.source.clone()).collect()
    }

    #[test]
    fn collects_layers_outermost_first() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lib/deep")).unwrap();
        fs::write(root.join(".coplint.json"), "{}").unwrap();
        fs::write(root.join("lib/deep/.coplint.jsonc"), "// nested\n{}").unwrap();

        let source = DirectoryConfig::new(Some(ConfigLayer::default()));
        let layers = source.layers_for(&root.join("lib/deep/a.cop")).unwrap();

        assert_eq!(
            sources(&layers),
            vec![
                root.join(".coplint.json").display().to_string(),
                root.join("lib/deep/.coplint.jsonc").display().to_string(),
                String::new(),
            ]
        );
        assert_eq!(layers[1].base_dir.as_deref(), Some(root.join("lib/deep").as_path()));
    }

    #[test]
    fn prefers_json_over_jsonc() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".coplint.json"), "{}").unwrap();
        fs::write(dir.path().join(".coplint.jsonc"), "{}").unwrap();

        let layers = DirectoryConfig::default()
            .layers_for(&dir.path().join("a.cop"))
            .unwrap();
        let found: Vec<_> = layers
            .iter()
            .filter(|l| l.base_dir.as_deref() == Some(dir.path()))
            .collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].source.ends_with(".coplint.json"));
    }

    #[test]
    fn broken_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".coplint.json"), "{ \"Style\": ").unwrap();

        let err = DirectoryConfig::default()
            .layers_for(&dir.path().join("a.cop"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
