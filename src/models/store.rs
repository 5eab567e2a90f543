// Model store - single-file persistence for the model bundle
//
// Saves go through a temp file in the same directory followed by a rename,
// so a reader sees either the previous bundle or the new one, never a
// partial write. Each save gets its own temp file; concurrent writers never
// share one, and the last rename wins.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::bundle::ModelBundle;
use crate::config::constants::MODEL_FILE_NAME;

#[derive(Debug, Clone)]
pub struct ModelStore {
    model_dir: PathBuf,
    model_path: PathBuf,
}

impl ModelStore {
    /// Open a store rooted at `model_dir`, creating the directory if absent
    pub fn open(model_dir: impl Into<PathBuf>) -> Result<Self> {
        let model_dir = model_dir.into();
        fs::create_dir_all(&model_dir).with_context(|| {
            format!("Failed to create model directory: {}", model_dir.display())
        })?;
        let model_path = model_dir.join(MODEL_FILE_NAME);
        Ok(Self {
            model_dir,
            model_path,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn exists(&self) -> bool {
        self.model_path.exists()
    }

    /// Load the bundle. `Ok(None)` means nothing has been trained yet.
    pub fn load(&self) -> Result<Option<ModelBundle>> {
        let json = match fs::read_to_string(&self.model_path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read model from {}", self.model_path.display())
                })
            }
        };

        let bundle: ModelBundle = serde_json::from_str(&json).with_context(|| {
            format!("Failed to parse model bundle {}", self.model_path.display())
        })?;
        bundle
            .validate()
            .with_context(|| format!("Invalid model bundle {}", self.model_path.display()))?;

        tracing::info!(
            path = %self.model_path.display(),
            model_id = %bundle.model_id,
            features = bundle.num_features(),
            classes = bundle.num_classes(),
            "Model loaded"
        );
        Ok(Some(bundle))
    }

    /// Persist the bundle (atomic replace). Returns the final path.
    pub fn save(&self, bundle: &ModelBundle) -> Result<PathBuf> {
        let temp_path = self
            .model_dir
            .join(format!("{}.{}.tmp", MODEL_FILE_NAME, Uuid::new_v4()));
        let json = serde_json::to_string(bundle).context("Failed to serialize model bundle")?;

        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write to {}", temp_path.display()))?;

        if let Err(err) = fs::rename(&temp_path, &self.model_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err).with_context(|| {
                format!(
                    "Failed to rename {} to {}",
                    temp_path.display(),
                    self.model_path.display()
                )
            });
        }

        tracing::info!(
            path = %self.model_path.display(),
            model_id = %bundle.model_id,
            "Model saved"
        );
        Ok(self.model_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bundle::fixtures::tiny_bundle;

    #[test]
    fn test_open_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("model");
        let store = ModelStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(!store.exists());
    }

    #[test]
    fn test_load_missing_is_none() {
        let root = tempfile::tempdir().unwrap();
        let store = ModelStore::open(root.path()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_preserves_bundle() {
        let root = tempfile::tempdir().unwrap();
        let store = ModelStore::open(root.path()).unwrap();
        let bundle = tiny_bundle();

        let path = store.save(&bundle).unwrap();
        assert_eq!(path, root.path().join("model.json"));

        let loaded = store.load().unwrap().expect("bundle should exist");
        assert_eq!(loaded.model_id, bundle.model_id);
        assert_eq!(loaded.feature_names, bundle.feature_names);
        assert_eq!(loaded.label_encoder, bundle.label_encoder);
        // Thresholds and leaf values must come back bit-for-bit
        assert_eq!(loaded.classifier, bundle.classifier);
        assert_eq!(loaded.feature_importance, bundle.feature_importance);
    }

    #[test]
    fn test_reloaded_model_predicts_identically() {
        let root = tempfile::tempdir().unwrap();
        let store = ModelStore::open(root.path()).unwrap();
        let bundle = tiny_bundle();
        store.save(&bundle).unwrap();
        let loaded = store.load().unwrap().unwrap();

        for dow in 0..7 {
            for portions in [0.0, 33.3, 45.0, 55.5, 71.25] {
                let row = [f64::from(dow), portions];
                let before = bundle.classifier.predict_proba(&row);
                let after = loaded.classifier.predict_proba(&row);
                assert_eq!(before, after, "dow={dow} portions={portions}");
            }
        }
    }

    #[test]
    fn test_concurrent_saves_all_succeed() {
        let root = tempfile::tempdir().unwrap();
        let store = ModelStore::open(root.path()).unwrap();
        let first = tiny_bundle();
        let second = tiny_bundle();

        for _ in 0..50 {
            std::thread::scope(|scope| {
                let a = scope.spawn(|| store.save(&first));
                let b = scope.spawn(|| store.save(&second));
                a.join().unwrap().unwrap();
                b.join().unwrap().unwrap();
            });
        }

        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.model_id == first.model_id || loaded.model_id == second.model_id);

        let names: Vec<String> = fs::read_dir(root.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["model.json".to_string()]);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let root = tempfile::tempdir().unwrap();
        let store = ModelStore::open(root.path()).unwrap();
        store.save(&tiny_bundle()).unwrap();
        store.save(&tiny_bundle()).unwrap();

        let names: Vec<String> = fs::read_dir(root.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["model.json".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let store = ModelStore::open(root.path()).unwrap();
        fs::write(store.model_path(), "{ not json").unwrap();
        assert!(store.load().is_err());
    }
}
