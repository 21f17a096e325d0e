//! All-or-nothing persistence of one outcome's artifact set.

use crate::artifact::{BaselineArtifact, BaselineKind, EnsembleArtifact, ScalerArtifact};
use crate::error::{ArtifactError, Result};
use lifepath_model::{TargetScaler, TrainedOutcome};
use std::fs;
use std::path::{Path, PathBuf};

/// A directory of per-outcome model artifacts.
///
/// File names follow the outcome stem: `<stem>_logit` / `<stem>_ols`,
/// `<stem>_ml.txt` and `<stem>_scaler`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) the artifact directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The directory artifacts are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn baseline_path(&self, stem: &str, kind: BaselineKind) -> PathBuf {
        self.root.join(format!("{stem}_{}", kind.suffix()))
    }

    fn ensemble_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}_ml.txt"))
    }

    fn scaler_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}_scaler"))
    }

    /// Persist one outcome's full artifact set atomically.
    ///
    /// Every file is first written to a `.tmp` sibling; the set is renamed
    /// into place only once all writes succeeded. Any failure removes the
    /// staged files, so a later reader sees either the complete set or
    /// nothing new. Returns the final paths.
    pub fn save_outcome(
        &self,
        stem: &str,
        trained: &TrainedOutcome,
        target_scaler: Option<&TargetScaler>,
    ) -> Result<Vec<PathBuf>> {
        let baseline = BaselineArtifact::from_trained(trained)?;
        let ensemble = EnsembleArtifact::from_trained(trained);

        let mut files: Vec<(PathBuf, String)> = vec![
            (
                self.baseline_path(stem, baseline.kind),
                serde_json::to_string_pretty(&baseline)?,
            ),
            (
                self.ensemble_path(stem),
                serde_json::to_string(&ensemble)?,
            ),
        ];
        if let Some(scaler) = target_scaler {
            files.push((
                self.scaler_path(stem),
                serde_json::to_string_pretty(&ScalerArtifact::from(scaler))?,
            ));
        }

        let staged: Vec<PathBuf> = files
            .iter()
            .map(|(path, _)| path.with_extension(staged_extension(path)))
            .collect();

        let write_all = || -> Result<()> {
            for ((_, contents), tmp) in files.iter().zip(staged.iter()) {
                fs::write(tmp, contents)?;
            }
            for ((path, _), tmp) in files.iter().zip(staged.iter()) {
                fs::rename(tmp, path)?;
            }
            Ok(())
        };

        if let Err(error) = write_all() {
            for tmp in &staged {
                fs::remove_file(tmp).ok();
            }
            return Err(error);
        }
        Ok(files.into_iter().map(|(path, _)| path).collect())
    }

    /// Load a baseline artifact by outcome stem and parametric family.
    pub fn load_baseline(&self, stem: &str, kind: BaselineKind) -> Result<BaselineArtifact> {
        let path = self.baseline_path(stem, kind);
        Ok(serde_json::from_str(&read(&path)?)?)
    }

    /// Load a boosted-ensemble artifact by outcome stem.
    pub fn load_ensemble(&self, stem: &str) -> Result<EnsembleArtifact> {
        let path = self.ensemble_path(stem);
        Ok(serde_json::from_str(&read(&path)?)?)
    }

    /// Load a target-scaler artifact by outcome stem.
    pub fn load_target_scaler(&self, stem: &str) -> Result<ScalerArtifact> {
        let path = self.scaler_path(stem);
        Ok(serde_json::from_str(&read(&path)?)?)
    }
}

/// Staged files keep the full original name plus `.tmp`.
fn staged_extension(path: &Path) -> String {
    match path.extension() {
        Some(extension) => format!("{}.tmp", extension.to_string_lossy()),
        None => "tmp".to_string(),
    }
}

fn read(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ArtifactError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}
