//! Lock-free UI ↔ audio thread messaging.
//!
//! The UI thread sends commands; the audio thread drains them at the top of
//! every render call and answers with notifications. Payloads move by
//! ownership: whole processors, graphs, and sample buffers cross the channel,
//! never shared references.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};

/// Default capacity of the notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Channel pair between a UI thread and one audio host.
///
/// Commands travel on an unbounded channel so the UI never blocks.
/// Notifications travel on a bounded one so the audio thread never allocates
/// to send; when it is full, the hosts park notifications in a
/// [`ReleaseQueue`] until there is room.
pub struct EngineBridge<C, N> {
    command_tx: Sender<C>,
    command_rx: Receiver<C>,
    notify_tx: Sender<N>,
    notify_rx: Receiver<N>,
    running: Arc<AtomicBool>,
}

impl<C, N> Default for EngineBridge<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, N> EngineBridge<C, N> {
    /// Create a bridge with the default notification capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NOTIFICATION_CAPACITY)
    }

    /// Create a bridge holding at most `capacity` undelivered notifications.
    pub fn with_capacity(capacity: usize) -> Self {
        let (command_tx, command_rx) = unbounded();
        let (notify_tx, notify_rx) = bounded(capacity);
        Self {
            command_tx,
            command_rx,
            notify_tx,
            notify_rx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Send a command to the audio thread (UI thread).
    ///
    /// Never fails while the bridge is alive, since it holds a receiver.
    pub fn send_command(&self, command: C) {
        let _ = self.command_tx.send(command);
    }

    /// Get a clone of the command sender.
    pub fn command_sender(&self) -> Sender<C> {
        self.command_tx.clone()
    }

    /// The audio thread's end of the bridge.
    pub fn audio_endpoint(&self) -> AudioEndpoint<C, N> {
        AudioEndpoint {
            commands: self.command_rx.clone(),
            notifications: self.notify_tx.clone(),
        }
    }

    /// Next pending notification, if any (UI thread).
    pub fn try_receive(&self) -> Option<N> {
        self.notify_rx.try_recv().ok()
    }

    /// Drain every pending notification (UI thread).
    pub fn drain_notifications(&self) -> Vec<N> {
        self.notify_rx.try_iter().collect()
    }

    /// Set the running state.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Check if audio is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the running flag.
    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

/// Audio-thread side of an [`EngineBridge`]. Every call is non-blocking.
pub struct AudioEndpoint<C, N> {
    commands: Receiver<C>,
    notifications: Sender<N>,
}

impl<C, N> Clone for AudioEndpoint<C, N> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            notifications: self.notifications.clone(),
        }
    }
}

impl<C, N> AudioEndpoint<C, N> {
    /// Next pending command, if any.
    #[inline]
    pub fn poll(&self) -> Option<C> {
        self.commands.try_recv().ok()
    }

    /// Send a notification to the UI thread.
    ///
    /// Returns the notification back if the channel is full or the UI side
    /// is gone, so the caller decides where its payload is dropped.
    #[inline]
    pub fn notify(&self, notification: N) -> Result<(), N> {
        self.notifications.try_send(notification).map_err(|e| match e {
            TrySendError::Full(n) | TrySendError::Disconnected(n) => n,
        })
    }

    /// Returns true if the notification channel has no room left.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.notifications.is_full()
    }
}

/// Audio-side holding area for notifications the channel had no room for.
///
/// Payload-carrying notifications must be freed on the UI thread, so a full
/// channel parks them here instead of dropping them. [`flush`](Self::flush)
/// retries in order at the top of the next render call. While anything is
/// parked, new notifications queue behind it so the UI sees them in order.
///
/// Storage is reserved up front. Pushing past the reserve grows the queue,
/// which allocates, but never drops a payload. A disconnected UI side is the
/// one case where payloads are dropped here, since nothing is left to free
/// them.
#[derive(Debug)]
pub struct ReleaseQueue<N> {
    pending: VecDeque<N>,
}

impl<N> Default for ReleaseQueue<N> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl<N> ReleaseQueue<N> {
    /// Create a queue with room for `capacity` parked notifications.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
        }
    }

    /// Deliver `notification`, or park it if the channel is full.
    pub fn send<C>(&mut self, endpoint: &AudioEndpoint<C, N>, notification: N) {
        if !self.flush(endpoint) {
            self.pending.push_back(notification);
            return;
        }
        match endpoint.notifications.try_send(notification) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(n)) => self.pending.push_back(n),
        }
    }

    /// Retry parked notifications in order. Returns true once none are left.
    pub fn flush<C>(&mut self, endpoint: &AudioEndpoint<C, N>) -> bool {
        while let Some(notification) = self.pending.pop_front() {
            match endpoint.notifications.try_send(notification) {
                Ok(()) => {}
                Err(TrySendError::Full(n)) => {
                    self.pending.push_front(n);
                    return false;
                }
                Err(TrySendError::Disconnected(_)) => self.pending.clear(),
            }
        }
        true
    }

    /// Number of parked notifications.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
