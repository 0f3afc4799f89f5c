use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use ulid::Ulid;

use crate::model::StayWindow;

const CHANNEL_CAPACITY: usize = 256;

/// What the guest should hear about after a booking changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingNotice {
    Confirmed {
        booking_id: Ulid,
        hotel_id: Ulid,
        email: String,
        window: StayWindow,
    },
    Cancelled {
        booking_id: Ulid,
        email: String,
        cancelled_by: String,
    },
    Deleted {
        booking_id: Ulid,
        email: String,
    },
}

impl BookingNotice {
    pub fn recipient(&self) -> &str {
        match self {
            BookingNotice::Confirmed { email, .. }
            | BookingNotice::Cancelled { email, .. }
            | BookingNotice::Deleted { email, .. } => email,
        }
    }
}

/// Broadcast hub for booking notices. Sending never blocks or fails the caller.
pub struct NotifyHub {
    sender: broadcast::Sender<BookingNotice>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingNotice> {
        self.sender.subscribe()
    }

    /// No-op if nobody is listening.
    pub fn send(&self, notice: BookingNotice) {
        let _ = self.sender.send(notice);
    }
}

#[derive(Debug, thiserror::Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Transactional email collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, notice: &BookingNotice) -> Result<(), MailError>;
}

/// Writes notices to the log instead of sending mail.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn deliver(&self, notice: &BookingNotice) -> Result<(), MailError> {
        tracing::info!(to = notice.recipient(), "mail: {notice:?}");
        Ok(())
    }
}

/// Forward every notice on the hub to `mailer` until the hub is dropped.
pub fn spawn_mailer(hub: &NotifyHub, mailer: Arc<dyn Mailer>) -> JoinHandle<()> {
    let mut rx = hub.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notice) => {
                    if let Err(e) = mailer.deliver(&notice).await {
                        tracing::error!(to = notice.recipient(), "{e}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("mailer lagged, {skipped} notices dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<BookingNotice>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn deliver(&self, notice: &BookingNotice) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    fn deleted(email: &str) -> BookingNotice {
        BookingNotice::Deleted {
            booking_id: Ulid::new(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe();
        let notice = deleted("guest@example.com");
        hub.send(notice.clone());
        assert_eq!(rx.recv().await.unwrap(), notice);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        hub.send(deleted("nobody@example.com"));
    }

    #[tokio::test]
    async fn mailer_task_delivers_and_stops_with_hub() {
        let hub = NotifyHub::new();
        let mailer = Arc::new(RecordingMailer::default());
        let task = spawn_mailer(&hub, mailer.clone());

        hub.send(deleted("a@example.com"));
        hub.send(deleted("b@example.com"));
        drop(hub);
        task.await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].recipient(), "b@example.com");
    }
}
