use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::camera::camera_session::CameraSession;
use crate::camera::domain::camera_device::{CameraBackend, DeviceEvent, DisplayRequest};
use crate::camera::domain::device_error::{
    DeviceError, DeviceErrorKind, ResponseCode, STATUS_DEVICE_INVALIDATED,
};
use crate::camera::domain::device_policy::{CameraDescriptor, DevicePolicy};
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraSetupError {
    #[error("no camera detected")]
    NoCamera,
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl CameraSetupError {
    pub fn response_code(&self) -> ResponseCode {
        match self {
            CameraSetupError::NoCamera => ResponseCode::NoCameraDetected,
            CameraSetupError::Device(e) => e.response_code(),
        }
    }
}

/// Result of a [`CameraSessionManager::set_active`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The caller performed the setup/teardown itself.
    Applied,
    /// Another setup/teardown was in flight; it will apply this request
    /// when it finishes.
    Deferred,
}

struct SetupGuard {
    in_flight: bool,
    desired_active: bool,
}

struct DisplayState {
    request: Box<dyn DisplayRequest>,
    active: bool,
}

/// Sole owner of the camera hardware for one enrollment page/session.
///
/// Setup and teardown are serialized through a guard: a request that
/// arrives while another is running only records the desired state, and the
/// running caller applies it afterwards. Device events arrive on a channel
/// and are latched until the capture flow's next checkpoint asks for them.
pub struct CameraSessionManager {
    backend: Box<dyn CameraBackend>,
    policy: DevicePolicy,
    display: Mutex<DisplayState>,
    session: Mutex<Option<CameraSession>>,
    guard: Mutex<SetupGuard>,
    events_tx: Sender<DeviceEvent>,
    events_rx: Receiver<DeviceEvent>,
    pending_error: Mutex<Option<DeviceError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CameraSessionManager {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        policy: DevicePolicy,
        display: Box<dyn DisplayRequest>,
    ) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            backend,
            policy,
            display: Mutex::new(DisplayState {
                request: display,
                active: false,
            }),
            session: Mutex::new(None),
            guard: Mutex::new(SetupGuard {
                in_flight: false,
                desired_active: false,
            }),
            events_tx,
            events_rx,
            pending_error: Mutex::new(None),
        }
    }

    /// All usable capture devices in selection order.
    pub fn list_devices(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        let devices = self.backend.list_devices()?;
        Ok(self.policy.rank_devices(&devices))
    }

    /// Opens `device`, replacing any session that is already open.
    pub fn open(&self, device: &CameraDescriptor) -> Result<(), DeviceError> {
        self.teardown();
        self.reset_pending_error();

        log::info!("Opening camera {} ({})", device.name, device.id);
        let handle = self.backend.open(&device.id)?;
        let session = CameraSession::open(device.clone(), handle, self.events_tx.clone())?;
        *lock(&self.session) = Some(session);
        Ok(())
    }

    pub fn start_preview(&self) -> Result<(), DeviceError> {
        {
            let mut session = lock(&self.session);
            let session = session
                .as_mut()
                .ok_or_else(|| DeviceError::other("no camera is open"))?;
            session.start_preview()?;
        }
        let mut display = lock(&self.display);
        if !display.active {
            display.request.request_active();
            display.active = true;
        }
        Ok(())
    }

    pub fn stop_preview(&self) -> Result<(), DeviceError> {
        if let Some(session) = lock(&self.session).as_mut() {
            session.stop_preview()?;
        }
        Ok(())
    }

    pub fn close(&self) {
        self.teardown();
    }

    pub fn is_open(&self) -> bool {
        lock(&self.session).is_some()
    }

    pub fn is_previewing(&self) -> bool {
        lock(&self.session)
            .as_ref()
            .is_some_and(|s| s.is_previewing())
    }

    /// Name of the open camera, if any.
    pub fn active_device(&self) -> Option<CameraDescriptor> {
        lock(&self.session).as_ref().map(|s| s.descriptor().clone())
    }

    /// Requests the camera be running (`true`) or released (`false`).
    ///
    /// Coalesces with an in-flight request instead of interleaving two
    /// reconfigurations.
    pub fn set_active(&self, active: bool) -> Result<Transition, CameraSetupError> {
        {
            let mut guard = lock(&self.guard);
            guard.desired_active = active;
            if guard.in_flight {
                log::debug!("Camera reconfiguration in flight; deferring active={active}");
                return Ok(Transition::Deferred);
            }
            guard.in_flight = true;
        }

        loop {
            let target = lock(&self.guard).desired_active;
            let result = if target {
                self.setup()
            } else {
                self.teardown();
                Ok(())
            };

            let mut guard = lock(&self.guard);
            if result.is_err() || guard.desired_active == target {
                guard.in_flight = false;
                return result.map(|_| Transition::Applied);
            }
        }
    }

    fn setup(&self) -> Result<(), CameraSetupError> {
        if self.is_previewing() {
            return Ok(());
        }
        let devices = self.list_devices()?;
        let Some(device) = self.policy.select_device(&devices) else {
            log::warn!("No usable camera found");
            return Err(CameraSetupError::NoCamera);
        };
        self.open(device)?;
        if let Err(e) = self.start_preview() {
            self.teardown();
            return Err(e.into());
        }
        Ok(())
    }

    /// Stops the preview, releases the display request, detaches device
    /// handlers and disposes the device. Safe to call with nothing open.
    pub fn teardown(&self) {
        let session = lock(&self.session).take();
        if let Some(mut session) = session {
            if let Err(e) = session.stop_preview() {
                log::warn!("Failed to stop preview: {e}");
            }
            self.release_display();
            drop(session);
        } else {
            self.release_display();
        }
    }

    fn release_display(&self) {
        let mut display = lock(&self.display);
        if display.active {
            display.request.request_release();
            display.active = false;
        }
    }

    /// Grabs one frame from the live preview.
    pub fn capture_frame(&self) -> Result<Frame, DeviceError> {
        lock(&self.session)
            .as_mut()
            .ok_or_else(|| DeviceError::other("no camera is open"))?
            .capture_frame()
    }

    /// Drains device events and raises (and clears) any latched failure.
    pub fn check_pending_error(&self) -> Result<(), DeviceError> {
        let mut pending = lock(&self.pending_error);
        for event in self.events_rx.try_iter() {
            let error = match event {
                DeviceEvent::Failed(fault) => DeviceError::from_fault(fault),
                DeviceEvent::Removed => DeviceError::from_status(STATUS_DEVICE_INVALIDATED),
                DeviceEvent::StateChanged(state) => {
                    log::debug!("Camera state changed: {state}");
                    continue;
                }
            };
            if error.kind == DeviceErrorKind::NoError {
                continue;
            }
            log::warn!("Camera failure latched: {error}");
            pending.get_or_insert(error);
        }
        match pending.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn reset_pending_error(&self) {
        let mut pending = lock(&self.pending_error);
        self.events_rx.try_iter().for_each(drop);
        *pending = None;
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
