use crossbeam_channel::Sender;

use crate::camera::domain::camera_device::{CameraDevice, DeviceEvent};
use crate::camera::domain::device_error::DeviceError;
use crate::camera::domain::device_policy::CameraDescriptor;
use crate::camera::domain::stream_descriptor::{select_best_stream, StreamDescriptor, StreamKind};
use crate::shared::frame::Frame;

/// An open camera with its event handlers attached.
///
/// Construction registers the device event sink and negotiates stream
/// resolutions; dropping the session stops any running preview, detaches the
/// sink and disposes the device, whichever path the owner leaves by.
pub struct CameraSession {
    descriptor: CameraDescriptor,
    device: Box<dyn CameraDevice>,
    preview_stream: Option<StreamDescriptor>,
    photo_stream: Option<StreamDescriptor>,
    previewing: bool,
}

impl CameraSession {
    pub fn open(
        descriptor: CameraDescriptor,
        mut device: Box<dyn CameraDevice>,
        events: Sender<DeviceEvent>,
    ) -> Result<Self, DeviceError> {
        device.subscribe(events);
        let mut session = Self {
            descriptor,
            device,
            preview_stream: None,
            photo_stream: None,
            previewing: false,
        };
        session.preview_stream = session.negotiate(StreamKind::Preview)?;
        session.photo_stream = session.negotiate(StreamKind::Photo)?;
        Ok(session)
    }

    fn negotiate(&mut self, kind: StreamKind) -> Result<Option<StreamDescriptor>, DeviceError> {
        let Some(best) = select_best_stream(&self.device.available_streams(kind)) else {
            log::debug!("{}: no {kind:?} streams advertised", self.descriptor.name);
            return Ok(None);
        };
        self.device.set_stream(kind, &best)?;
        log::debug!(
            "{}: {kind:?} stream {}x{} @ {:.1} fps",
            self.descriptor.name,
            best.width(),
            best.height(),
            best.frame_rate()
        );
        Ok(Some(best))
    }

    pub fn descriptor(&self) -> &CameraDescriptor {
        &self.descriptor
    }

    pub fn preview_stream(&self) -> Option<&StreamDescriptor> {
        self.preview_stream.as_ref()
    }

    pub fn photo_stream(&self) -> Option<&StreamDescriptor> {
        self.photo_stream.as_ref()
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn start_preview(&mut self) -> Result<(), DeviceError> {
        if !self.previewing {
            self.device.start_preview()?;
            self.previewing = true;
        }
        Ok(())
    }

    pub fn stop_preview(&mut self) -> Result<(), DeviceError> {
        if self.previewing {
            self.previewing = false;
            self.device.stop_preview()?;
        }
        Ok(())
    }

    pub fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        if !self.previewing {
            return Err(DeviceError::other("preview is not running"));
        }
        self.device.capture_frame()
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop_preview() {
            log::warn!("{}: failed to stop preview: {e}", self.descriptor.name);
        }
        self.device.unsubscribe();
        log::info!("Released camera {}", self.descriptor.name);
    }
}
