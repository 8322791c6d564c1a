//! Upload progress reporting.
//!
//! The uploader pushes raw byte counts into a [`ProgressSender`]; the
//! controller drains the matching [`ProgressStream`] and renders each value.
//! The stream ends when the sender is dropped, i.e. when the upload finishes.

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

/// Integer percentage for `loaded / total`, rounded to nearest.
///
/// Returns `None` when the total is unknown (zero or not finite).
pub fn percent(loaded: f64, total: f64) -> Option<u8> {
    if !total.is_finite() || total <= 0.0 || !loaded.is_finite() {
        return None;
    }
    let pct = ((loaded / total) * 100.0).round().clamp(0.0, 100.0);
    Some(pct as u8)
}

/// What the progress indicator shows for one value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressDisplay {
    pub value: u8,
}

impl ProgressDisplay {
    pub const START: ProgressDisplay = ProgressDisplay { value: 0 };

    pub fn new(value: u8) -> Self {
        Self { value: value.min(100) }
    }

    /// Value for `aria-valuenow`.
    pub fn aria_value(&self) -> String {
        self.value.to_string()
    }

    /// CSS width of the bar.
    pub fn width(&self) -> String {
        format!("{}%", self.value)
    }

    /// Text inside the bar.
    pub fn label(&self) -> String {
        format!("{}%", self.value)
    }
}

/// Producer side handed to the uploader.
#[derive(Clone, Debug)]
pub struct ProgressSender {
    tx: UnboundedSender<u8>,
}

impl ProgressSender {
    /// Report a progress event. Events with an unknown total are dropped.
    pub fn report(&self, loaded: f64, total: f64) {
        if let Some(pct) = percent(loaded, total) {
            log::debug!("Upload progress: {} / {} bytes ({}%)", loaded, total, pct);
            // The controller may already be gone; nothing to do then.
            let _ = self.tx.unbounded_send(pct);
        }
    }
}

/// Consumer side drained by the controller.
pub type ProgressStream = UnboundedReceiver<u8>;

/// Create a fresh, single-use progress channel.
pub fn progress_channel() -> (ProgressSender, ProgressStream) {
    let (tx, rx) = unbounded();
    (ProgressSender { tx }, rx)
}
