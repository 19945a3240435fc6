use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use faceenroll_core::camera::domain::camera_device::NoopDisplayRequest;
use faceenroll_core::camera::infrastructure::image_sequence_camera::ImageSequenceBackend;
use faceenroll_core::camera::session_manager::CameraSessionManager;
use faceenroll_core::capture::capture_flow::CaptureFlowController;
use faceenroll_core::capture::pacer::SleepPacer;
use faceenroll_core::config::app_config::AppConfig;
use faceenroll_core::cropping::infrastructure::png_thumbnail_writer::PngThumbnailWriter;
use faceenroll_core::detection::infrastructure::rustface_detector::RustfaceDetector;
use faceenroll_core::pipeline::enroll_face_use_case::{EnrollFaceUseCase, EnrollmentOutcome};
use faceenroll_core::pipeline::enrollment_observer::LogEnrollmentObserver;
use faceenroll_core::pipeline::infrastructure::enrollment_worker::{self, EnrollmentMessage};
use faceenroll_core::recognition::infrastructure::file_gallery_engine::FileGalleryEngineFactory;
use faceenroll_core::shared::cancel_token::CancelToken;
use faceenroll_core::shared::model_resolver;

/// Register a person's face with the recognition engine.
#[derive(Parser)]
#[command(name = "faceenroll")]
struct Cli {
    /// Settings file (defaults to the per-user config, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture face samples and enroll them under NAME.
    Enroll {
        /// Display name to register.
        name: String,

        /// Directory whose sub-directories act as cameras.
        #[arg(long)]
        camera_root: PathBuf,

        /// Number of face samples to collect.
        #[arg(long)]
        samples: Option<usize>,

        /// Write each accepted face crop to this directory.
        #[arg(long)]
        thumbnails: Option<PathBuf>,

        /// SeetaFace detector model file.
        #[arg(long)]
        detector_model: Option<PathBuf>,

        /// Delay between countdown steps in milliseconds.
        #[arg(long)]
        step_delay_ms: Option<u64>,

        /// Directory searched for model files not found elsewhere.
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Use the camera whose id contains this text instead of the top-ranked one.
        #[arg(long)]
        camera: Option<String>,
    },
    /// List usable cameras in selection order.
    Devices {
        /// Directory whose sub-directories act as cameras.
        #[arg(long)]
        camera_root: PathBuf,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Devices { camera_root } => list_devices(&config, &camera_root),
        Command::Enroll {
            name,
            camera_root,
            samples,
            thumbnails,
            detector_model,
            step_delay_ms,
            model_dir,
            camera,
        } => {
            if let Some(samples) = samples {
                if samples == 0 {
                    return Err("--samples must be at least 1".into());
                }
                config.capture.target_samples = samples;
            }
            if let Some(delay) = step_delay_ms {
                config.capture.step_delay_ms = delay;
            }
            if let Some(model) = detector_model {
                config.detector_model = model;
            }
            if camera.is_some() {
                config.device_policy.preferred_device_id = camera;
            }
            if thumbnails.is_some() {
                config.thumbnail_dir = thumbnails;
            }
            enroll(&config, &name, &camera_root, model_dir.as_deref())
        }
    }
}

fn camera_manager(config: &AppConfig, camera_root: &Path) -> CameraSessionManager {
    CameraSessionManager::new(
        Box::new(ImageSequenceBackend::new(camera_root)),
        config.device_policy.clone(),
        Box::new(NoopDisplayRequest),
    )
}

fn list_devices(config: &AppConfig, camera_root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let devices = camera_manager(config, camera_root).list_devices()?;
    if devices.is_empty() {
        println!("No usable cameras found");
    }
    for (i, device) in devices.iter().enumerate() {
        println!("{}. {} ({})", i + 1, device.name, device.id);
    }
    Ok(())
}

fn enroll(
    config: &AppConfig,
    name: &str,
    camera_root: &Path,
    model_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let model_path = model_resolver::resolve(&config.detector_model, model_dir)?;
    let detector = RustfaceDetector::new(&model_path)?;

    let cancel = CancelToken::new();
    let camera = Arc::new(camera_manager(config, camera_root));
    let mut capture = CaptureFlowController::new(
        camera.clone(),
        Box::new(detector),
        Box::new(SleepPacer),
        config.capture.clone(),
        cancel.clone(),
    );
    if let Some(dir) = &config.thumbnail_dir {
        capture = capture.with_thumbnail_writer(Box::new(PngThumbnailWriter::new()), dir);
    }

    let use_case = EnrollFaceUseCase::new(
        camera,
        capture,
        Box::new(FileGalleryEngineFactory),
        config.engine.resolve_models(model_dir),
        cancel,
    )
    .with_observer(Box::new(LogEnrollmentObserver::new()));

    let task = enrollment_worker::spawn(use_case, name);
    for message in task.messages().iter() {
        match message {
            EnrollmentMessage::Status(status) => println!("{status}"),
            EnrollmentMessage::Finished(_) => break,
        }
    }

    match task.wait() {
        EnrollmentOutcome::Registered(_) => Ok(()),
        EnrollmentOutcome::Aborted(code) => Err(format!("{code}: {}", code.message()).into()),
        EnrollmentOutcome::EngineFailed(failure) => Err(failure.into()),
        other => Err(other.status().to_string().into()),
    }
}
