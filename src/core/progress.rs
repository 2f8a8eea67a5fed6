use tokio::sync::mpsc;

/// A coarse progress update: what is happening and how far along (0-100).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub message: String,
    pub percent: u8,
}

/// Sends progress to whoever is listening. Cheap to clone; a reporter with
/// no listener silently drops events.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, message: impl Into<String>, percent: u8) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(ProgressEvent {
                message: message.into(),
                percent: percent.min(100),
            });
        }
    }
}
