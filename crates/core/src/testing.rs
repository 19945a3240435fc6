//! Test doubles shared by the unit tests of several modules.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::camera::domain::camera_device::{
    CameraBackend, CameraDevice, DeviceEvent, DisplayRequest,
};
use crate::camera::domain::device_error::{DeviceError, PlatformFault};
use crate::camera::domain::device_policy::CameraDescriptor;
use crate::camera::domain::stream_descriptor::{StreamDescriptor, StreamFormat, StreamKind};
use crate::capture::pacer::Pacer;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::enrollment_observer::{EnrollmentObserver, EnrollmentStatus};
use crate::recognition::domain::engine_config::EngineConfiguration;
use crate::recognition::domain::enrollment_request::{EnrollmentRequest, FaceInfo};
use crate::recognition::domain::error_record::{EngineFailure, ErrorRecord};
use crate::recognition::domain::recognition_engine::{
    EngineFactory, EngineLogger, RecognitionEngine,
};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::{Frame, PixelFormat};

pub const FAKE_WIDTH: u32 = 64;
pub const FAKE_HEIGHT: u32 = 48;

pub fn blank_frame(index: usize) -> Frame {
    Frame::new(
        vec![128u8; (FAKE_WIDTH * FAKE_HEIGHT * 4) as usize],
        FAKE_WIDTH,
        FAKE_HEIGHT,
        PixelFormat::Bgra8,
        index,
    )
}

pub fn centered_face() -> FaceBox {
    FaceBox::from_xywh(16, 8, 32, 32)
}

// --- Camera ---

/// Ordered record of calls made against fake camera components, plus the
/// event sink of the currently subscribed device.
#[derive(Clone, Default)]
pub struct FakeCameraLog {
    events: Arc<Mutex<Vec<String>>>,
    sink: Arc<Mutex<Option<Sender<DeviceEvent>>>>,
}

impl FakeCameraLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// Delivers an event as if the platform raised it asynchronously.
    pub fn emit(&self, event: DeviceEvent) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.send(event).unwrap();
        }
    }
}

pub struct FakeCamera {
    log: FakeCameraLog,
    preview_streams: Vec<StreamDescriptor>,
    photo_streams: Vec<StreamDescriptor>,
    fail_set_stream: bool,
    fail_preview: bool,
    frame_count: usize,
}

impl FakeCamera {
    pub fn new(log: FakeCameraLog) -> Self {
        Self {
            log,
            preview_streams: vec![StreamDescriptor::Video(StreamFormat::new(
                FAKE_WIDTH,
                FAKE_HEIGHT,
                30.0,
            ))],
            photo_streams: vec![StreamDescriptor::Image(StreamFormat::new(
                FAKE_WIDTH,
                FAKE_HEIGHT,
                0.0,
            ))],
            fail_set_stream: false,
            fail_preview: false,
            frame_count: 0,
        }
    }

    pub fn with_streams(
        mut self,
        preview: Vec<StreamDescriptor>,
        photo: Vec<StreamDescriptor>,
    ) -> Self {
        self.preview_streams = preview;
        self.photo_streams = photo;
        self
    }

    pub fn failing_set_stream(mut self) -> Self {
        self.fail_set_stream = true;
        self
    }

    pub fn failing_preview(mut self) -> Self {
        self.fail_preview = true;
        self
    }
}

impl CameraDevice for FakeCamera {
    fn available_streams(&self, kind: StreamKind) -> Vec<StreamDescriptor> {
        match kind {
            StreamKind::Preview => self.preview_streams.clone(),
            StreamKind::Photo => self.photo_streams.clone(),
        }
    }

    fn set_stream(
        &mut self,
        kind: StreamKind,
        stream: &StreamDescriptor,
    ) -> Result<(), DeviceError> {
        if self.fail_set_stream {
            return Err(DeviceError::other("unsupported media type"));
        }
        self.log.push(format!(
            "set_stream {kind:?} {}x{}",
            stream.width(),
            stream.height()
        ));
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), DeviceError> {
        if self.fail_preview {
            return Err(DeviceError::from_status(
                crate::camera::domain::device_error::STATUS_DEVICE_IN_USE,
            ));
        }
        self.log.push("start_preview");
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), DeviceError> {
        self.log.push("stop_preview");
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        let frame = blank_frame(self.frame_count);
        self.frame_count += 1;
        Ok(frame)
    }

    fn subscribe(&mut self, events: Sender<DeviceEvent>) {
        self.log.push("subscribe");
        *self.log.sink.lock().unwrap() = Some(events);
    }

    fn unsubscribe(&mut self) {
        self.log.push("unsubscribe");
        *self.log.sink.lock().unwrap() = None;
    }
}

impl Drop for FakeCamera {
    fn drop(&mut self) {
        self.log.push("dispose");
    }
}

/// Blocks `open` until the test releases it.
#[derive(Clone, Default)]
pub struct Gate {
    state: Arc<(Mutex<(bool, bool)>, Condvar)>,
}

impl Gate {
    fn enter_and_wait(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();
        state.0 = true;
        cvar.notify_all();
        while !state.1 {
            state = cvar.wait(state).unwrap();
        }
    }

    pub fn wait_until_entered(&self) {
        let (lock, cvar) = &*self.state;
        let mut state = lock.lock().unwrap();
        while !state.0 {
            state = cvar.wait(state).unwrap();
        }
    }

    pub fn release(&self) {
        let (lock, cvar) = &*self.state;
        lock.lock().unwrap().1 = true;
        cvar.notify_all();
    }
}

pub struct FakeBackend {
    log: FakeCameraLog,
    devices: Vec<CameraDescriptor>,
    open_fault: Option<PlatformFault>,
    fail_preview: bool,
    gate: Option<Gate>,
}

impl FakeBackend {
    /// Devices use their name as id.
    pub fn new(log: FakeCameraLog, names: &[&str]) -> Self {
        Self {
            log,
            devices: names
                .iter()
                .map(|n| CameraDescriptor::new(*n, *n))
                .collect(),
            open_fault: None,
            fail_preview: false,
            gate: None,
        }
    }

    pub fn failing_open(mut self, fault: PlatformFault) -> Self {
        self.open_fault = Some(fault);
        self
    }

    pub fn failing_preview(mut self) -> Self {
        self.fail_preview = true;
        self
    }

    pub fn gated_open(mut self) -> (Self, Gate) {
        let gate = Gate::default();
        self.gate = Some(gate.clone());
        (self, gate)
    }
}

impl CameraBackend for FakeBackend {
    fn list_devices(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        Ok(self.devices.clone())
    }

    fn open(&self, device_id: &str) -> Result<Box<dyn CameraDevice>, DeviceError> {
        if let Some(gate) = &self.gate {
            gate.enter_and_wait();
        }
        if let Some(fault) = &self.open_fault {
            return Err(DeviceError::from_fault(fault.clone()));
        }
        self.log.push(format!("open {device_id}"));
        let camera = FakeCamera::new(self.log.clone());
        Ok(Box::new(if self.fail_preview {
            camera.failing_preview()
        } else {
            camera
        }))
    }
}

pub struct RecordingDisplay {
    log: FakeCameraLog,
}

impl RecordingDisplay {
    pub fn new(log: FakeCameraLog) -> Self {
        Self { log }
    }
}

impl DisplayRequest for RecordingDisplay {
    fn request_active(&mut self) {
        self.log.push("display_active");
    }

    fn request_release(&mut self) {
        self.log.push("display_release");
    }
}

// --- Detection ---

/// Returns scripted detection results in order, then a single centered
/// face for every later frame.
pub struct ScriptedDetector {
    results: VecDeque<Vec<FaceBox>>,
}

impl ScriptedDetector {
    pub fn new(results: Vec<Vec<FaceBox>>) -> Self {
        Self {
            results: results.into(),
        }
    }

    pub fn always_one_face() -> Self {
        Self::new(Vec::new())
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        Ok(self
            .results
            .pop_front()
            .unwrap_or_else(|| vec![centered_face()]))
    }
}

// --- Pacing ---

/// Records requested pauses without sleeping.
#[derive(Clone, Default)]
pub struct InstantPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
    on_pause: Option<Arc<dyn Fn(usize) + Send + Sync>>,
}

impl InstantPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }

    /// Runs `hook` with the 1-based pause number on every pause.
    pub fn with_hook(hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        Self {
            pauses: Arc::default(),
            on_pause: Some(Arc::new(hook)),
        }
    }
}

impl Pacer for InstantPacer {
    fn pause(&mut self, duration: Duration) {
        let count = {
            let mut pauses = self.pauses.lock().unwrap();
            pauses.push(duration);
            pauses.len()
        };
        if let Some(hook) = &self.on_pause {
            hook(count);
        }
    }
}

// --- Engine ---

pub fn record(code: i32, class_name: &str, function_name: &str, message: &str) -> ErrorRecord {
    ErrorRecord {
        code,
        class_name: class_name.to_string(),
        function_name: function_name.to_string(),
        message: message.to_string(),
    }
}

#[derive(Clone, Default)]
pub struct StubEngineScript {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_initialize: Option<EngineFailure>,
    pub fail_create_face: Option<EngineFailure>,
    pub fail_train: Option<EngineFailure>,
}

impl StubEngineScript {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

pub struct StubEngineFactory {
    pub script: StubEngineScript,
}

impl EngineFactory for StubEngineFactory {
    fn initialize(
        &self,
        _config: &EngineConfiguration,
    ) -> Result<Box<dyn RecognitionEngine>, EngineFailure> {
        self.script.calls.lock().unwrap().push("initialize".into());
        if let Some(failure) = &self.script.fail_initialize {
            return Err(failure.clone());
        }
        Ok(Box::new(StubEngine {
            script: self.script.clone(),
            logger: None,
        }))
    }
}

pub struct StubEngine {
    script: StubEngineScript,
    logger: Option<EngineLogger>,
}

impl StubEngine {
    fn emit(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger(message);
        }
    }
}

impl RecognitionEngine for StubEngine {
    fn set_logger(&mut self, logger: EngineLogger) {
        self.logger = Some(logger);
    }

    fn create_face(&mut self, request: &EnrollmentRequest) -> Result<FaceInfo, EngineFailure> {
        self.script.calls.lock().unwrap().push("create_face".into());
        self.emit(&format!("creating face for {}", request.user_name()));
        if let Some(failure) = &self.script.fail_create_face {
            return Err(failure.clone());
        }
        Ok(FaceInfo {
            face_id: 1,
            user_name: request.user_name().to_string(),
            sample_count: request.samples().len(),
        })
    }

    fn train(&mut self) -> Result<(), EngineFailure> {
        self.script.calls.lock().unwrap().push("train".into());
        self.emit("training classifier");
        match &self.script.fail_train {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn terminate(&mut self) -> Vec<ErrorRecord> {
        self.script.calls.lock().unwrap().push("terminate".into());
        Vec::new()
    }
}

// --- Observer ---

#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub statuses: Arc<Mutex<Vec<EnrollmentStatus>>>,
}

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<EnrollmentStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.statuses().iter().map(|s| s.to_string()).collect()
    }
}

impl EnrollmentObserver for RecordingObserver {
    fn status(&mut self, status: &EnrollmentStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }
}
