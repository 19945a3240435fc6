use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;

use crate::camera::domain::camera_device::{CameraBackend, CameraDevice, DeviceEvent};
use crate::camera::domain::device_error::{DeviceError, PlatformFault};
use crate::camera::domain::device_policy::CameraDescriptor;
use crate::camera::domain::stream_descriptor::{StreamDescriptor, StreamFormat, StreamKind};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Frame rate advertised for image-sequence previews.
const SEQUENCE_FPS: f64 = 30.0;

/// Treats every sub-directory of `root` as a camera whose preview cycles
/// through the images it contains.
///
/// Used for headless runs and tests where no capture hardware exists; the
/// directory name is the device name and its path the device id.
pub struct ImageSequenceBackend {
    root: PathBuf,
}

impl ImageSequenceBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn io_error(e: io::Error) -> DeviceError {
    if e.kind() == io::ErrorKind::PermissionDenied {
        DeviceError::from_fault(PlatformFault::AccessDenied)
    } else {
        DeviceError::other(e.to_string())
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl CameraBackend for ImageSequenceBackend {
    fn list_devices(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)
            .map_err(io_error)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        Ok(dirs
            .into_iter()
            .filter_map(|p| {
                let name = p.file_name()?.to_str()?.to_string();
                Some(CameraDescriptor::new(p.display().to_string(), name))
            })
            .collect())
    }

    fn open(&self, device_id: &str) -> Result<Box<dyn CameraDevice>, DeviceError> {
        Ok(Box::new(ImageSequenceCamera::open(Path::new(device_id))?))
    }
}

pub struct ImageSequenceCamera {
    files: Vec<PathBuf>,
    native: StreamFormat,
    preview: StreamFormat,
    cursor: usize,
    streaming: bool,
    events: Option<Sender<DeviceEvent>>,
}

impl ImageSequenceCamera {
    pub fn open(dir: &Path) -> Result<Self, DeviceError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_image(p))
            .collect();
        files.sort();

        let first = files
            .first()
            .ok_or_else(|| DeviceError::other(format!("no frames in {}", dir.display())))?;
        let (width, height) =
            image::image_dimensions(first).map_err(|e| DeviceError::other(e.to_string()))?;
        let native = StreamFormat::new(width, height, SEQUENCE_FPS);

        log::debug!(
            "Image sequence {} has {} frames at {width}x{height}",
            dir.display(),
            files.len()
        );
        Ok(Self {
            files,
            native,
            preview: native,
            cursor: 0,
            streaming: false,
            events: None,
        })
    }

    fn notify(&self, event: DeviceEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

impl CameraDevice for ImageSequenceCamera {
    fn available_streams(&self, kind: StreamKind) -> Vec<StreamDescriptor> {
        let StreamFormat { width, height, .. } = self.native;
        match kind {
            StreamKind::Preview => vec![
                StreamDescriptor::Video(StreamFormat::new(width / 2, height / 2, SEQUENCE_FPS)),
                StreamDescriptor::Video(self.native),
            ],
            StreamKind::Photo => vec![StreamDescriptor::Image(StreamFormat::new(
                width, height, 0.0,
            ))],
        }
    }

    fn set_stream(
        &mut self,
        kind: StreamKind,
        stream: &StreamDescriptor,
    ) -> Result<(), DeviceError> {
        if !self.available_streams(kind).contains(stream) {
            return Err(DeviceError::other(format!(
                "unsupported {kind:?} stream {}x{}",
                stream.width(),
                stream.height()
            )));
        }
        if kind == StreamKind::Preview {
            self.preview = *stream.format();
        }
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), DeviceError> {
        self.streaming = true;
        self.notify(DeviceEvent::StateChanged("streaming".into()));
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), DeviceError> {
        self.streaming = false;
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame, DeviceError> {
        if !self.streaming {
            return Err(DeviceError::other("preview is not running"));
        }
        let path = &self.files[self.cursor % self.files.len()];
        let decoded = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                if !path.exists() {
                    self.notify(DeviceEvent::Removed);
                }
                return Err(DeviceError::other(format!("{}: {e}", path.display())));
            }
        };

        let rgba = if decoded.dimensions() != (self.preview.width, self.preview.height) {
            image::imageops::resize(
                &decoded,
                self.preview.width,
                self.preview.height,
                image::imageops::FilterType::Triangle,
            )
        } else {
            decoded
        };

        let frame = Frame::from_rgba_image(&rgba, self.cursor);
        self.cursor += 1;
        Ok(frame)
    }

    fn subscribe(&mut self, events: Sender<DeviceEvent>) {
        self.events = Some(events);
    }

    fn unsubscribe(&mut self) {
        self.events = None;
    }
}
