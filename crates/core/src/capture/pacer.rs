use std::time::Duration;

/// Waits between scripted capture steps.
pub trait Pacer: Send {
    fn pause(&mut self, duration: Duration);
}

/// Blocks the calling thread for the requested time.
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
