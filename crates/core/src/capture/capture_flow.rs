use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::camera::domain::device_error::DeviceError;
use crate::camera::session_manager::CameraSessionManager;
use crate::capture::domain::capture_settings::CaptureSettings;
use crate::capture::domain::capture_status::{CaptureState, CaptureStatus};
use crate::capture::domain::sample_buffer::SampleBuffer;
use crate::capture::pacer::Pacer;
use crate::cropping::domain::frame_cropper::{crop, CropError};
use crate::cropping::domain::thumbnail_writer::ThumbnailWriter;
use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::enrollment_request::EnrollmentRequest;
use crate::recognition::domain::error_record::EngineFailure;
use crate::shared::cancel_token::CancelToken;
use crate::shared::constants::THUMBNAIL_SIZE;
use crate::shared::face_sample::FaceSample;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("camera failure: {0}")]
    Device(#[from] DeviceError),
    #[error("capture cancelled")]
    Cancelled,
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("failed to crop face: {0}")]
    Crop(#[from] CropError),
    #[error("failed to write thumbnail: {0}")]
    Thumbnail(String),
    #[error("sample buffer already holds all {target} samples")]
    BufferFull { target: usize },
}

struct ThumbnailSink {
    writer: Box<dyn ThumbnailWriter>,
    dir: PathBuf,
}

/// Scripted countdown → capture → crop → accumulate sequence.
///
/// Each [`capture`](Self::capture) call is one user-initiated action. Every
/// countdown step ends at a checkpoint: pause, then honor cancellation, then
/// raise any device failure latched by the camera since the last
/// checkpoint. The sample buffer is only written from the capture tick.
pub struct CaptureFlowController {
    camera: Arc<CameraSessionManager>,
    detector: Box<dyn FaceDetector>,
    pacer: Box<dyn Pacer>,
    settings: CaptureSettings,
    cancel: CancelToken,
    buffer: SampleBuffer,
    state: CaptureState,
    thumbnails: Vec<Frame>,
    thumbnail_sink: Option<ThumbnailSink>,
}

impl CaptureFlowController {
    pub fn new(
        camera: Arc<CameraSessionManager>,
        detector: Box<dyn FaceDetector>,
        pacer: Box<dyn Pacer>,
        settings: CaptureSettings,
        cancel: CancelToken,
    ) -> Self {
        let buffer = SampleBuffer::new(settings.target_samples);
        Self {
            camera,
            detector,
            pacer,
            settings,
            cancel,
            buffer,
            state: CaptureState::Idle,
            thumbnails: Vec::new(),
            thumbnail_sink: None,
        }
    }

    /// Also writes each accepted crop to `dir/slot_<n>.png`.
    pub fn with_thumbnail_writer(
        mut self,
        writer: Box<dyn ThumbnailWriter>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.thumbnail_sink = Some(ThumbnailSink {
            writer,
            dir: dir.into(),
        });
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn collected(&self) -> usize {
        self.buffer.len()
    }

    pub fn target(&self) -> usize {
        self.buffer.target()
    }

    pub fn is_complete(&self) -> bool {
        self.buffer.is_full()
    }

    /// Cropped faces in slot order.
    pub fn thumbnails(&self) -> &[Frame] {
        &self.thumbnails
    }

    /// Runs one capture action, reporting every status through `on_status`
    /// and returning the last one.
    pub fn capture(
        &mut self,
        on_status: &mut dyn FnMut(&CaptureStatus),
    ) -> Result<CaptureStatus, CaptureError> {
        if self.buffer.is_full() {
            self.state = CaptureState::ReadyToSubmit;
            let status = CaptureStatus::Complete {
                collected: self.buffer.len(),
            };
            on_status(&status);
            return Ok(status);
        }

        match self.run_capture(on_status) {
            Ok(status) => {
                self.state = self.resting_state();
                on_status(&status);
                Ok(status)
            }
            Err(e) => {
                self.state = self.resting_state();
                Err(e)
            }
        }
    }

    /// Repeats [`capture`](Self::capture) until the target is reached or
    /// `max_attempts` actions have run. Returns the number collected.
    pub fn capture_until_complete(
        &mut self,
        on_status: &mut dyn FnMut(&CaptureStatus),
    ) -> Result<usize, CaptureError> {
        let mut attempts = 0;
        while !self.buffer.is_full() && attempts < self.settings.max_attempts {
            attempts += 1;
            self.capture(on_status)?;
        }
        if self.buffer.is_full() {
            self.capture(on_status)?;
        } else {
            log::warn!(
                "Gave up after {attempts} attempts with {} of {} samples",
                self.buffer.len(),
                self.buffer.target()
            );
        }
        Ok(self.buffer.len())
    }

    /// Hands the collected samples over as a request and starts a fresh
    /// buffer.
    pub fn take_request(&mut self, user_name: &str) -> Result<EnrollmentRequest, EngineFailure> {
        let buffer = std::mem::replace(
            &mut self.buffer,
            SampleBuffer::new(self.settings.target_samples),
        );
        self.thumbnails.clear();
        self.state = CaptureState::Idle;
        buffer.into_request(user_name)
    }

    fn run_capture(
        &mut self,
        on_status: &mut dyn FnMut(&CaptureStatus),
    ) -> Result<CaptureStatus, CaptureError> {
        for n in (1..=self.settings.countdown_from).rev() {
            self.state = CaptureState::Countdown(n);
            on_status(&CaptureStatus::Countdown(n));
            self.checkpoint()?;
        }
        self.state = CaptureState::CaptureWindow;
        self.capture_tick()
    }

    fn checkpoint(&mut self) -> Result<(), CaptureError> {
        self.pacer.pause(self.settings.step_delay());
        self.ensure_live()
    }

    fn ensure_live(&self) -> Result<(), CaptureError> {
        if self.cancel.is_cancelled() {
            return Err(CaptureError::Cancelled);
        }
        self.camera.check_pending_error()?;
        Ok(())
    }

    fn capture_tick(&mut self) -> Result<CaptureStatus, CaptureError> {
        self.ensure_live()?;

        let frame = self.camera.capture_frame().map_err(|e| {
            // Cancellation tears the camera down underneath us.
            if self.cancel.is_cancelled() {
                CaptureError::Cancelled
            } else {
                CaptureError::Device(e)
            }
        })?;

        let faces = self
            .detector
            .detect(&frame)
            .map_err(|e| CaptureError::Detection(e.to_string()))?;

        let face = match faces.as_slice() {
            [] => {
                log::debug!("Frame {}: no face", frame.index());
                return Ok(CaptureStatus::NoFace);
            }
            [face] => *face,
            many => {
                log::debug!("Frame {}: {} faces", frame.index(), many.len());
                return Ok(CaptureStatus::MultipleFaces(many.len()));
            }
        };

        let thumbnail = crop(&frame, &face)?;
        let slot = self.buffer.len();
        if let Some(sink) = &self.thumbnail_sink {
            let path = sink.dir.join(format!("slot_{slot}.png"));
            sink.writer
                .write(&path, &thumbnail, Some((THUMBNAIL_SIZE, THUMBNAIL_SIZE)))
                .map_err(|e| CaptureError::Thumbnail(e.to_string()))?;
        }

        let slot = self
            .buffer
            .push(FaceSample::new(frame, face))
            .map_err(|_| CaptureError::BufferFull {
                target: self.buffer.target(),
            })?;
        self.thumbnails.push(thumbnail);
        log::info!(
            "Accepted sample {} of {}",
            self.buffer.len(),
            self.buffer.target()
        );

        Ok(CaptureStatus::Accepted {
            slot,
            collected: self.buffer.len(),
            target: self.buffer.target(),
        })
    }

    fn resting_state(&self) -> CaptureState {
        if self.buffer.is_full() {
            CaptureState::ReadyToSubmit
        } else if self.buffer.is_empty() {
            CaptureState::Idle
        } else {
            CaptureState::Accumulating
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::domain::camera_device::{DeviceEvent, NoopDisplayRequest};
    use crate::camera::domain::device_error::DeviceErrorKind;
    use crate::camera::domain::device_policy::DevicePolicy;
    use crate::cropping::infrastructure::png_thumbnail_writer::PngThumbnailWriter;
    use crate::shared::face_box::FaceBox;
    use crate::testing::{
        centered_face, FakeBackend, FakeCameraLog, InstantPacer, ScriptedDetector,
    };
    use std::time::Duration;

    fn live_camera(log: &FakeCameraLog) -> Arc<CameraSessionManager> {
        let camera = CameraSessionManager::new(
            Box::new(FakeBackend::new(log.clone(), &["Front"])),
            DevicePolicy::default(),
            Box::new(NoopDisplayRequest),
        );
        camera.set_active(true).unwrap();
        Arc::new(camera)
    }

    fn settings(target: usize) -> CaptureSettings {
        CaptureSettings {
            target_samples: target,
            countdown_from: 3,
            step_delay_ms: 1000,
            max_attempts: 10,
        }
    }

    fn controller(
        camera: Arc<CameraSessionManager>,
        detector: ScriptedDetector,
        pacer: InstantPacer,
        target: usize,
        cancel: CancelToken,
    ) -> CaptureFlowController {
        CaptureFlowController::new(
            camera,
            Box::new(detector),
            Box::new(pacer),
            settings(target),
            cancel,
        )
    }

    fn run(flow: &mut CaptureFlowController) -> (Result<CaptureStatus, CaptureError>, Vec<CaptureStatus>) {
        let mut seen = Vec::new();
        let result = flow.capture(&mut |s| seen.push(s.clone()));
        (result, seen)
    }

    fn two_faces() -> Vec<FaceBox> {
        vec![FaceBox::from_xywh(0, 0, 10, 10), FaceBox::from_xywh(30, 10, 10, 10)]
    }

    #[test]
    fn test_overflow_is_not_reported_as_detection_failure() {
        let err = CaptureError::BufferFull { target: 5 };
        assert_eq!(err.to_string(), "sample buffer already holds all 5 samples");
        assert!(!matches!(err, CaptureError::Detection(_)));
    }

    // --- Countdown and acceptance ---

    #[test]
    fn test_countdown_then_single_face_is_accepted() {
        let log = FakeCameraLog::default();
        let pacer = InstantPacer::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::always_one_face(),
            pacer.clone(),
            2,
            CancelToken::new(),
        );

        let (result, seen) = run(&mut flow);

        let accepted = CaptureStatus::Accepted {
            slot: 0,
            collected: 1,
            target: 2,
        };
        assert_eq!(result.unwrap(), accepted);
        assert_eq!(
            seen,
            vec![
                CaptureStatus::Countdown(3),
                CaptureStatus::Countdown(2),
                CaptureStatus::Countdown(1),
                accepted,
            ]
        );
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(1); 3]);
        assert_eq!(flow.state(), CaptureState::Accumulating);
        assert_eq!(flow.thumbnails().len(), 1);
        assert_eq!(flow.thumbnails()[0].width() as i32, centered_face().width());
    }

    #[test]
    fn test_no_face_leaves_buffer_untouched() {
        let log = FakeCameraLog::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::new(vec![vec![]]),
            InstantPacer::default(),
            2,
            CancelToken::new(),
        );

        let (result, _) = run(&mut flow);

        assert_eq!(result.unwrap(), CaptureStatus::NoFace);
        assert_eq!(flow.collected(), 0);
        assert_eq!(flow.state(), CaptureState::Idle);
        assert!(flow.thumbnails().is_empty());
    }

    #[test]
    fn test_multiple_faces_leave_buffer_untouched() {
        let log = FakeCameraLog::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::new(vec![two_faces()]),
            InstantPacer::default(),
            2,
            CancelToken::new(),
        );

        let (result, seen) = run(&mut flow);

        assert_eq!(result.unwrap(), CaptureStatus::MultipleFaces(2));
        assert_eq!(seen.last(), Some(&CaptureStatus::MultipleFaces(2)));
        assert_eq!(flow.collected(), 0);
    }

    #[test]
    fn test_full_buffer_reports_complete_without_capturing() {
        let log = FakeCameraLog::default();
        let pacer = InstantPacer::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::always_one_face(),
            pacer.clone(),
            1,
            CancelToken::new(),
        );
        run(&mut flow).0.unwrap();
        let pauses_before = pacer.pauses().len();

        let (result, seen) = run(&mut flow);

        assert_eq!(result.unwrap(), CaptureStatus::Complete { collected: 1 });
        assert_eq!(seen.len(), 1);
        assert_eq!(pacer.pauses().len(), pauses_before);
        assert_eq!(flow.state(), CaptureState::ReadyToSubmit);
    }

    #[test]
    fn test_zero_countdown_captures_immediately() {
        let log = FakeCameraLog::default();
        let pacer = InstantPacer::default();
        let mut flow = CaptureFlowController::new(
            live_camera(&log),
            Box::new(ScriptedDetector::always_one_face()),
            Box::new(pacer.clone()),
            CaptureSettings {
                countdown_from: 0,
                ..settings(1)
            },
            CancelToken::new(),
        );

        let (result, seen) = run(&mut flow);

        assert!(result.unwrap().is_accepted());
        assert_eq!(seen.len(), 1);
        assert!(pacer.pauses().is_empty());
    }

    // --- Checkpoints ---

    #[test]
    fn test_cancel_is_honored_at_next_checkpoint() {
        let log = FakeCameraLog::default();
        let cancel = CancelToken::new();
        let hook_token = cancel.clone();
        let pacer = InstantPacer::with_hook(move |n| {
            if n == 2 {
                hook_token.cancel();
            }
        });
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::always_one_face(),
            pacer.clone(),
            2,
            cancel,
        );

        let (result, seen) = run(&mut flow);

        assert!(matches!(result, Err(CaptureError::Cancelled)));
        assert_eq!(pacer.pauses().len(), 2);
        assert_eq!(seen.len(), 2);
        assert_eq!(flow.collected(), 0);
    }

    #[test]
    fn test_device_removal_is_raised_at_next_checkpoint() {
        let log = FakeCameraLog::default();
        let camera = live_camera(&log);
        let pacer = InstantPacer::default();
        let mut flow = controller(
            camera,
            ScriptedDetector::always_one_face(),
            pacer.clone(),
            2,
            CancelToken::new(),
        );
        log.emit(DeviceEvent::Removed);

        let (result, seen) = run(&mut flow);

        match result {
            Err(CaptureError::Device(e)) => assert_eq!(e.kind, DeviceErrorKind::DeviceError),
            other => panic!("unexpected result: {other:?}"),
        }
        // The countdown UI still showed its first step before the raise.
        assert_eq!(seen, vec![CaptureStatus::Countdown(3)]);
        assert_eq!(pacer.pauses().len(), 1);
        assert_eq!(flow.collected(), 0);
    }

    #[test]
    fn test_pending_error_is_raised_only_once() {
        let log = FakeCameraLog::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::always_one_face(),
            InstantPacer::default(),
            2,
            CancelToken::new(),
        );
        log.emit(DeviceEvent::Removed);

        assert!(run(&mut flow).0.is_err());
        assert!(run(&mut flow).0.unwrap().is_accepted());
    }

    #[test]
    fn test_closed_camera_is_device_error() {
        let log = FakeCameraLog::default();
        let camera = live_camera(&log);
        let mut flow = controller(
            camera.clone(),
            ScriptedDetector::always_one_face(),
            InstantPacer::default(),
            2,
            CancelToken::new(),
        );
        camera.teardown();

        assert!(matches!(run(&mut flow).0, Err(CaptureError::Device(_))));
    }

    // --- Unattended capture ---

    #[test]
    fn test_capture_until_complete_skips_rejected_frames() {
        let log = FakeCameraLog::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::new(vec![vec![], two_faces(), vec![centered_face()], vec![]]),
            InstantPacer::default(),
            3,
            CancelToken::new(),
        );
        let mut seen = Vec::new();

        let collected = flow.capture_until_complete(&mut |s| seen.push(s.clone())).unwrap();

        assert_eq!(collected, 3);
        assert!(seen.contains(&CaptureStatus::NoFace));
        assert!(seen.contains(&CaptureStatus::MultipleFaces(2)));
        assert_eq!(seen.last(), Some(&CaptureStatus::Complete { collected: 3 }));
        assert_eq!(flow.state(), CaptureState::ReadyToSubmit);
    }

    #[test]
    fn test_capture_until_complete_gives_up_after_max_attempts() {
        let log = FakeCameraLog::default();
        let mut flow = CaptureFlowController::new(
            live_camera(&log),
            Box::new(ScriptedDetector::new(vec![vec![]; 4])),
            Box::new(InstantPacer::default()),
            CaptureSettings {
                max_attempts: 4,
                ..settings(2)
            },
            CancelToken::new(),
        );

        let collected = flow.capture_until_complete(&mut |_| {}).unwrap();

        assert_eq!(collected, 0);
        assert!(!flow.is_complete());
    }

    #[test]
    fn test_take_request_consumes_samples() {
        let log = FakeCameraLog::default();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::always_one_face(),
            InstantPacer::default(),
            2,
            CancelToken::new(),
        );
        flow.capture_until_complete(&mut |_| {}).unwrap();

        let request = flow.take_request("Aiko").unwrap();

        assert_eq!(request.samples().len(), 2);
        assert_eq!(request.samples()[0].face, centered_face());
        assert_eq!(flow.collected(), 0);
        assert!(flow.thumbnails().is_empty());
        assert_eq!(flow.state(), CaptureState::Idle);
    }

    // --- Thumbnails ---

    #[test]
    fn test_accepted_crops_are_written_to_slots() {
        let log = FakeCameraLog::default();
        let dir = tempfile::tempdir().unwrap();
        let mut flow = controller(
            live_camera(&log),
            ScriptedDetector::always_one_face(),
            InstantPacer::default(),
            2,
            CancelToken::new(),
        )
        .with_thumbnail_writer(Box::new(PngThumbnailWriter::new()), dir.path());

        flow.capture_until_complete(&mut |_| {}).unwrap();

        for slot in 0..2 {
            let img = image::open(dir.path().join(format!("slot_{slot}.png"))).unwrap();
            assert_eq!((img.width(), img.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
        }
    }
}
