//! Change notification for the document collection.
//!
//! Listeners treat every signal as "invalidate and refetch": the signal has
//! no payload, and a listener that falls behind observes a single change
//! rather than one per missed mutation.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

const CHANNEL_CAPACITY: usize = 16;

/// Signal emitted after the persisted collection was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentsChanged;

/// Fan-out publisher shared by the store and anything that subscribes to it.
///
/// Cloning yields another handle to the same channel.
///
/// # Examples
/// ```
/// use portal::domain::ChangeNotifier;
///
/// let notifier = ChangeNotifier::new();
/// let mut subscription = notifier.subscribe();
/// notifier.notify();
/// assert!(subscription.try_changed());
/// assert!(!subscription.try_changed());
/// ```
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<DocumentsChanged>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    /// Create a channel with no listeners.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Register a listener. Dropping the returned handle unsubscribes it.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Broadcast a change to every current listener.
    pub fn notify(&self) {
        // Sending with zero receivers is not an error for this channel's users.
        let delivered = self.sender.send(DocumentsChanged).unwrap_or(0);
        tracing::trace!(listeners = delivered, "documents changed");
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Listener handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<DocumentsChanged>,
}

impl Subscription {
    /// Wait for the next change. Returns `false` once every notifier is gone.
    pub async fn changed(&mut self) -> bool {
        match self.receiver.recv().await {
            Ok(DocumentsChanged) => {
                self.drain();
                true
            }
            Err(RecvError::Lagged(_)) => {
                self.drain();
                true
            }
            Err(RecvError::Closed) => false,
        }
    }

    /// Non-blocking check; collapses any pending signals into one.
    pub fn try_changed(&mut self) -> bool {
        match self.receiver.try_recv() {
            Ok(DocumentsChanged) | Err(TryRecvError::Lagged(_)) => {
                self.drain();
                true
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => false,
        }
    }

    /// Explicitly remove this listener.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn drain(&mut self) {
        while matches!(
            self.receiver.try_recv(),
            Ok(DocumentsChanged) | Err(TryRecvError::Lagged(_))
        ) {}
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn every_listener_sees_the_change() {
        let notifier = ChangeNotifier::new();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        notifier.notify();
        assert!(first.try_changed());
        assert!(second.try_changed());
    }

    #[rstest]
    fn bursts_collapse_into_one_signal() {
        let notifier = ChangeNotifier::new();
        let mut subscription = notifier.subscribe();
        for _ in 0..(CHANNEL_CAPACITY * 2) {
            notifier.notify();
        }
        assert!(subscription.try_changed());
        assert!(!subscription.try_changed());
    }

    #[rstest]
    fn dropping_a_subscription_unsubscribes() {
        let notifier = ChangeNotifier::new();
        let subscription = notifier.subscribe();
        assert_eq!(notifier.listener_count(), 1);
        subscription.unsubscribe();
        assert_eq!(notifier.listener_count(), 0);
        notifier.notify();
    }

    #[rstest]
    #[tokio::test]
    async fn changed_reports_closed_channel() {
        let notifier = ChangeNotifier::new();
        let mut subscription = notifier.subscribe();
        drop(notifier);
        assert!(!subscription.changed().await);
    }

    #[rstest]
    #[tokio::test]
    async fn changed_wakes_on_notify() {
        let notifier = ChangeNotifier::new();
        let mut subscription = notifier.subscribe();
        notifier.notify();
        assert!(subscription.changed().await);
    }
}
