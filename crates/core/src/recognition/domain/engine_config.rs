use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::recognition::domain::error_record::{ErrorCode, ErrorRecord};
use crate::shared::model_resolver;

/// Network weights plus the topology descriptor that goes with them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkModel {
    pub weights: PathBuf,
    pub topology: PathBuf,
}

impl NetworkModel {
    pub fn new(weights: impl Into<PathBuf>, topology: impl Into<PathBuf>) -> Self {
        Self {
            weights: weights.into(),
            topology: topology.into(),
        }
    }
}

/// File locations handed to the recognition engine at initialization.
///
/// The feature database and the trained classifier are artifacts the engine
/// creates and updates itself; every model file is required to exist, except
/// the emotion network, which is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfiguration {
    pub feature_database: PathBuf,
    pub classifier: PathBuf,
    pub landmark_model: PathBuf,
    pub embedding_model: PathBuf,
    pub gender_svm: PathBuf,
    pub gender_network: NetworkModel,
    pub age_network: NetworkModel,
    pub emotion_network: Option<NetworkModel>,
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            feature_database: PathBuf::from("faces.db"),
            classifier: PathBuf::from("df.dat"),
            landmark_model: PathBuf::from("models/dlib/shape_predictor_with_glass.dat"),
            embedding_model: PathBuf::from("models/dlib/dlib_face_recognition_resnet_model_v1.dat"),
            gender_svm: PathBuf::from("models/dlib/genderdf.dat"),
            gender_network: NetworkModel::new(
                "models/caffe/gender/gender_net.caffemodel",
                "models/caffe/gender/deploy_gender.prototxt",
            ),
            age_network: NetworkModel::new(
                "models/caffe/age/age_net.caffemodel",
                "models/caffe/age/deploy_age.prototxt",
            ),
            emotion_network: None,
        }
    }
}

impl EngineConfiguration {
    /// Places every path under `dir`; absolute paths are left alone.
    pub fn rooted_at(&self, dir: &Path) -> Self {
        self.map_paths(|p| dir.join(p))
    }

    /// Resolves model files through the user model directory and then
    /// `bundled_dir`. Database and classifier paths are left as given since
    /// the engine may still have to create them.
    pub fn resolve_models(&self, bundled_dir: Option<&Path>) -> Self {
        let resolve = |p: &Path| model_resolver::resolve_or_keep(p, bundled_dir);
        let network = |n: &NetworkModel| NetworkModel {
            weights: resolve(&n.weights),
            topology: resolve(&n.topology),
        };
        Self {
            feature_database: self.feature_database.clone(),
            classifier: self.classifier.clone(),
            landmark_model: resolve(&self.landmark_model),
            embedding_model: resolve(&self.embedding_model),
            gender_svm: resolve(&self.gender_svm),
            gender_network: network(&self.gender_network),
            age_network: network(&self.age_network),
            emotion_network: self.emotion_network.as_ref().map(network),
        }
    }

    /// Labelled model files that must exist before the engine can start.
    pub fn required_files(&self) -> Vec<(&'static str, &Path)> {
        let mut files = vec![
            ("landmark model", self.landmark_model.as_path()),
            ("embedding model", self.embedding_model.as_path()),
            ("gender SVM", self.gender_svm.as_path()),
            ("gender weights", self.gender_network.weights.as_path()),
            ("gender topology", self.gender_network.topology.as_path()),
            ("age weights", self.age_network.weights.as_path()),
            ("age topology", self.age_network.topology.as_path()),
        ];
        if let Some(emotion) = &self.emotion_network {
            files.push(("emotion weights", emotion.weights.as_path()));
            files.push(("emotion topology", emotion.topology.as_path()));
        }
        files
    }

    /// One `FileNotFound` record per required file that does not exist.
    pub fn missing_files(&self) -> Vec<ErrorRecord> {
        self.required_files()
            .into_iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(label, path)| {
                ErrorRecord::new(
                    ErrorCode::FileNotFound,
                    "EngineConfiguration",
                    "missing_files",
                    format!("{label} not found: {}", path.display()),
                )
            })
            .collect()
    }

    fn map_paths(&self, f: impl Fn(&Path) -> PathBuf) -> Self {
        let network = |n: &NetworkModel| NetworkModel {
            weights: f(&n.weights),
            topology: f(&n.topology),
        };
        Self {
            feature_database: f(&self.feature_database),
            classifier: f(&self.classifier),
            landmark_model: f(&self.landmark_model),
            embedding_model: f(&self.embedding_model),
            gender_svm: f(&self.gender_svm),
            gender_network: network(&self.gender_network),
            age_network: network(&self.age_network),
            emotion_network: self.emotion_network.as_ref().map(network),
        }
    }
}
