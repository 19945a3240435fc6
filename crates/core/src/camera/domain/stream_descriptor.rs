use std::cmp::Ordering;

/// Which of the device's two streams a configuration applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Continuous low-latency feed used for display and frame sampling.
    Preview,
    /// Higher-resolution still capture.
    Photo,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    /// Frames per second; still-image streams report their burst rate or 0.
    pub frame_rate: f64,
}

impl StreamFormat {
    pub fn new(width: u32, height: u32, frame_rate: f64) -> Self {
        Self {
            width,
            height,
            frame_rate,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A stream configuration advertised by a camera.
///
/// Image and video properties carry the same fields so selection never has
/// to inspect which kind it is looking at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StreamDescriptor {
    Image(StreamFormat),
    Video(StreamFormat),
}

impl StreamDescriptor {
    pub fn format(&self) -> &StreamFormat {
        match self {
            StreamDescriptor::Image(f) | StreamDescriptor::Video(f) => f,
        }
    }

    pub fn width(&self) -> u32 {
        self.format().width
    }

    pub fn height(&self) -> u32 {
        self.format().height
    }

    pub fn frame_rate(&self) -> f64 {
        self.format().frame_rate
    }
}

/// Picks the configuration with the largest `width × height`, breaking ties
/// by the higher frame rate. Exact ties keep the first advertised entry.
pub fn select_best_stream(streams: &[StreamDescriptor]) -> Option<StreamDescriptor> {
    let mut best: Option<&StreamDescriptor> = None;
    for candidate in streams {
        let better = match best {
            None => true,
            Some(current) => compare(candidate, current) == Ordering::Greater,
        };
        if better {
            best = Some(candidate);
        }
    }
    best.copied()
}

fn compare(a: &StreamDescriptor, b: &StreamDescriptor) -> Ordering {
    a.format()
        .pixel_count()
        .cmp(&b.format().pixel_count())
        .then_with(|| a.frame_rate().total_cmp(&b.frame_rate()))
}
