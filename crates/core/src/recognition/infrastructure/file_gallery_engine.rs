use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cropping::domain::frame_cropper::crop;
use crate::cropping::domain::thumbnail_writer::ThumbnailWriter;
use crate::cropping::infrastructure::png_thumbnail_writer::PngThumbnailWriter;
use crate::recognition::domain::engine_config::EngineConfiguration;
use crate::recognition::domain::enrollment_request::{EnrollmentRequest, FaceInfo};
use crate::recognition::domain::error_record::{EngineFailure, ErrorCode, ErrorRecord};
use crate::recognition::domain::recognition_engine::{
    EngineFactory, EngineLogger, RecognitionEngine,
};

const CLASS_NAME: &str = "FileGalleryEngine";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryDatabase {
    pub next_face_id: u32,
    pub faces: Vec<GalleryEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub face_id: u32,
    pub user_name: String,
    pub samples: Vec<PathBuf>,
}

/// Label index written by `train`: which face id means which person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierIndex {
    pub labels: Vec<ClassifierLabel>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierLabel {
    pub face_id: u32,
    pub user_name: String,
    pub sample_count: usize,
}

/// Development engine that keeps its gallery on disk instead of computing
/// embeddings.
///
/// The feature database is a JSON file; each enrolled face gets a directory
/// of PNG crops next to it, and `train` writes a label index to the
/// classifier path. Model files are only checked for presence.
pub struct FileGalleryEngineFactory;

impl EngineFactory for FileGalleryEngineFactory {
    fn initialize(
        &self,
        config: &EngineConfiguration,
    ) -> Result<Box<dyn RecognitionEngine>, EngineFailure> {
        let missing = config.missing_files();
        if !missing.is_empty() {
            return Err(EngineFailure::new(ErrorCode::FileNotFound, missing));
        }
        Ok(Box::new(FileGalleryEngine::open(config.clone())?))
    }
}

pub struct FileGalleryEngine {
    config: EngineConfiguration,
    database: GalleryDatabase,
    writer: PngThumbnailWriter,
    logger: Option<EngineLogger>,
    terminated: bool,
}

impl FileGalleryEngine {
    pub fn open(config: EngineConfiguration) -> Result<Self, EngineFailure> {
        let database: GalleryDatabase = if config.feature_database.exists() {
            let text = fs::read_to_string(&config.feature_database)
                .map_err(|e| failure(ErrorCode::IoFailure, "Initialize", e))?;
            serde_json::from_str(&text)
                .map_err(|e| failure(ErrorCode::IoFailure, "Initialize", e))?
        } else {
            GalleryDatabase::default()
        };
        log::debug!(
            "Opened gallery {} with {} faces",
            config.feature_database.display(),
            database.faces.len()
        );
        Ok(Self {
            config,
            database,
            writer: PngThumbnailWriter::new(),
            logger: None,
            terminated: false,
        })
    }

    pub fn database(&self) -> &GalleryDatabase {
        &self.database
    }

    fn emit(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger(message);
        }
    }

    fn ensure_running(&self, function: &str) -> Result<(), EngineFailure> {
        if self.terminated {
            return Err(failure(ErrorCode::NotInitialized, function, "engine was terminated"));
        }
        Ok(())
    }

    fn sample_dir(&self, face_id: u32) -> PathBuf {
        parent_dir(&self.config.feature_database)
            .join("faces")
            .join(format!("{face_id:04}"))
    }

    fn save_database(&self, function: &str) -> Result<(), EngineFailure> {
        write_json(&self.config.feature_database, &self.database)
            .map_err(|e| failure(ErrorCode::IoFailure, function, e))
    }
}

impl RecognitionEngine for FileGalleryEngine {
    fn set_logger(&mut self, logger: EngineLogger) {
        self.logger = Some(logger);
    }

    fn create_face(&mut self, request: &EnrollmentRequest) -> Result<FaceInfo, EngineFailure> {
        self.ensure_running("CreateFace")?;

        let face_id = self.database.next_face_id.max(1);
        let dir = self.sample_dir(face_id);
        let mut samples = Vec::with_capacity(request.samples().len());
        for (i, sample) in request.samples().iter().enumerate() {
            let face = crop(&sample.frame, &sample.face)
                .map_err(|e| failure(ErrorCode::InvalidArgument, "CreateFace", e))?;
            let path = dir.join(format!("sample_{i:02}.png"));
            self.writer
                .write(&path, &face, None)
                .map_err(|e| failure(ErrorCode::IoFailure, "CreateFace", e))?;
            samples.push(path);
        }

        self.database.faces.push(GalleryEntry {
            face_id,
            user_name: request.user_name().to_string(),
            samples,
        });
        self.database.next_face_id = face_id + 1;
        self.save_database("CreateFace")?;
        self.emit(&format!(
            "CreateFace: {} samples for {} stored in {}",
            request.samples().len(),
            request.user_name(),
            dir.display()
        ));

        Ok(FaceInfo {
            face_id,
            user_name: request.user_name().to_string(),
            sample_count: request.samples().len(),
        })
    }

    fn train(&mut self) -> Result<(), EngineFailure> {
        self.ensure_running("Train")?;
        if self.database.faces.is_empty() {
            return Err(failure(ErrorCode::InvalidState, "Train", "no faces registered"));
        }
        let index = ClassifierIndex {
            labels: self
                .database
                .faces
                .iter()
                .map(|f| ClassifierLabel {
                    face_id: f.face_id,
                    user_name: f.user_name.clone(),
                    sample_count: f.samples.len(),
                })
                .collect(),
        };
        write_json(&self.config.classifier, &index)
            .map_err(|e| failure(ErrorCode::IoFailure, "Train", e))?;
        self.emit(&format!(
            "Train: {} labels written to {}",
            index.labels.len(),
            self.config.classifier.display()
        ));
        Ok(())
    }

    fn terminate(&mut self) -> Vec<ErrorRecord> {
        if self.terminated {
            return vec![ErrorRecord::new(
                ErrorCode::InvalidState,
                CLASS_NAME,
                "Terminate",
                "engine already terminated",
            )];
        }
        self.terminated = true;
        Vec::new()
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(parent_dir(path))?;
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn failure(code: ErrorCode, function: &str, message: impl ToString) -> EngineFailure {
    EngineFailure::from_record(ErrorRecord::new(
        code,
        CLASS_NAME,
        function,
        message.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_sample::FaceSample;
    use crate::testing::{blank_frame, centered_face};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn configured(tmp: &TempDir) -> EngineConfiguration {
        let config = EngineConfiguration::default().rooted_at(tmp.path());
        for (_, path) in config.required_files() {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"model").unwrap();
        }
        config
    }

    fn request(name: &str, n: usize) -> EnrollmentRequest {
        let samples = (0..n)
            .map(|i| FaceSample::new(blank_frame(i), centered_face()))
            .collect();
        EnrollmentRequest::new(name, samples).unwrap()
    }

    #[test]
    fn test_initialize_reports_every_missing_model() {
        let tmp = TempDir::new().unwrap();
        let config = EngineConfiguration::default().rooted_at(tmp.path());

        let err = FileGalleryEngineFactory.initialize(&config).err().unwrap();

        assert_eq!(err.code, ErrorCode::FileNotFound.value());
        assert_eq!(err.records.len(), config.required_files().len());
    }

    #[test]
    fn test_create_face_persists_database_and_crops() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();

        let info = engine.create_face(&request("Aiko", 3)).unwrap();

        assert_eq!(info.face_id, 1);
        assert_eq!(info.sample_count, 3);
        let text = fs::read_to_string(&config.feature_database).unwrap();
        let db: GalleryDatabase = serde_json::from_str(&text).unwrap();
        assert_eq!(db.faces.len(), 1);
        assert_eq!(db.faces[0].user_name, "Aiko");
        let crop = image::open(&db.faces[0].samples[2]).unwrap();
        assert_eq!((crop.width(), crop.height()), (32, 32));
    }

    #[test]
    fn test_face_ids_continue_across_sessions() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        {
            let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();
            engine.create_face(&request("Aiko", 1)).unwrap();
            engine.terminate();
        }
        let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();
        let info = engine.create_face(&request("Ren", 1)).unwrap();
        assert_eq!(info.face_id, 2);
    }

    #[test]
    fn test_train_writes_label_index() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();
        engine.create_face(&request("Aiko", 2)).unwrap();
        engine.create_face(&request("Ren", 4)).unwrap();

        engine.train().unwrap();

        let text = fs::read_to_string(&config.classifier).unwrap();
        let index: ClassifierIndex = serde_json::from_str(&text).unwrap();
        let names: Vec<_> = index.labels.iter().map(|l| l.user_name.as_str()).collect();
        assert_eq!(names, vec!["Aiko", "Ren"]);
        assert_eq!(index.labels[1].sample_count, 4);
    }

    #[test]
    fn test_progress_goes_to_installed_logger() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        engine.set_logger(Box::new(move |message: &str| {
            sink.lock().unwrap().push(message.to_string())
        }));

        engine.create_face(&request("Aiko", 2)).unwrap();
        engine.train().unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("CreateFace: 2 samples for Aiko"));
        assert!(lines[1].starts_with("Train: 1 labels"));
    }

    #[test]
    fn test_train_on_empty_gallery_fails() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();

        let err = engine.train().unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidState.value());
        assert!(!config.classifier.exists());
    }

    #[test]
    fn test_calls_after_terminate_fail() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        let mut engine = FileGalleryEngineFactory.initialize(&config).unwrap();

        assert!(engine.terminate().is_empty());

        assert!(engine.create_face(&request("Aiko", 1)).is_err());
        assert_eq!(engine.terminate().len(), 1);
    }

    #[test]
    fn test_corrupt_database_fails_initialize() {
        let tmp = TempDir::new().unwrap();
        let config = configured(&tmp);
        fs::write(&config.feature_database, b"{not json").unwrap();

        let err = FileGalleryEngineFactory.initialize(&config).err().unwrap();

        assert_eq!(err.code, ErrorCode::IoFailure.value());
        assert!(err.status_text().contains("Initialize"));
    }
}
