//! Continuous camera scanning frontend.
//!
//! Decodes barcode/QR payloads frame by frame and funnels them through
//! the shared gatekeeper. The camera hardware sits behind the [`Camera`] /
//! [`CameraTrack`] / [`FrameDecoder`] traits so the state machine is
//! testable with scripted doubles and portable across capture backends.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──► RequestingPermission ──► Streaming ◄──────────┐
//!                  │                    │                │
//!                  │ denied/missing     │ decode passes  │ result known
//!                  ▼                    ▼                │
//!             Unavailable          Validating ───────────┘
//!                                       │
//!                        stop requested ▼
//!                                    Stopped
//! ```
//!
//! While a validation is outstanding no frames are decoded - the loop is
//! awaiting the result, which is the pause the debounce contract asks
//! for. A stop request is observed at the next loop turn: an in-flight
//! validation completes and its report is still delivered, but no further
//! frame is processed, and the track is released on every exit path
//! (dropping a [`CameraTrack`] releases the device).

use crate::gatekeeper::{Gatekeeper, ScanReport};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// Why the camera frontend is unusable, each cause surfaced distinctly so
/// the operator knows whether to grant permission, plug in a device, or
/// fall back to manual entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The operator (or platform policy) denied camera access
    #[error("camera permission denied")]
    PermissionDenied,

    /// No capture device matched the selection
    #[error("no camera device found")]
    NotFound,

    /// The execution context does not allow camera capture at all
    #[error("camera requires a secure context")]
    InsecureContext,

    /// The active track has no controllable torch
    #[error("torch not supported by this camera")]
    TorchUnsupported,

    /// The device failed after acquisition
    #[error("camera failed: {0}")]
    Failed(String),
}

/// One captured frame, as a grayscale buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Row-major luminance data
    pub luma: Vec<u8>,
}

/// Which device to acquire when several are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DeviceSelection {
    /// Whatever the platform considers the default (usually rear-facing)
    #[default]
    Default,
    /// A specific device by its platform label
    ByLabel(String),
}

/// A capture device that can hand out exclusive tracks.
pub trait Camera: Send + Sync {
    /// Acquire an exclusive track on the selected device.
    ///
    /// Only one decode loop may run against a device at a time; the
    /// returned track embodies that ownership and releases the device
    /// when dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] naming the specific obstacle
    /// (permission, absence, insecure context).
    fn acquire(
        &self,
        selection: &DeviceSelection,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn CameraTrack>, DeviceError>> + Send + '_>>;
}

/// An exclusively held, running capture track.
///
/// Dropping the track synchronously releases the underlying device; every
/// exit path of the scan loop relies on that.
pub trait CameraTrack: Send {
    /// Wait for the next frame. `None` means the track died (device
    /// unplugged, stream ended) and will produce nothing further.
    fn next_frame(&mut self) -> Pin<Box<dyn Future<Output = Option<Frame>> + Send + '_>>;

    /// Whether this track has a controllable torch.
    fn torch_supported(&self) -> bool;

    /// Switch the torch on or off.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::TorchUnsupported`] when the track has no
    /// torch, or [`DeviceError::Failed`] if the control call failed.
    fn set_torch(&mut self, on: bool) -> Result<(), DeviceError>;
}

/// Decodes barcode/QR payloads out of frames.
pub trait FrameDecoder: Send + Sync {
    /// The decoded payload, if this frame contains a readable code.
    fn decode(&self, frame: &Frame) -> Option<String>;
}

/// Observable state of the camera frontend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CameraPhase {
    /// Constructed, not yet running
    Idle,
    /// Waiting on device acquisition / permission
    RequestingPermission,
    /// Decoding frames
    Streaming,
    /// A forwarded payload is being validated; decoding paused
    Validating,
    /// Stopped by request; the device has been released
    Stopped,
    /// Terminal: the camera cannot be used, with the reason
    Unavailable(DeviceError),
}

/// Remote control for a running scanner: stop and torch.
#[derive(Clone)]
pub struct ScannerHandle {
    stop: Arc<watch::Sender<bool>>,
    torch: mpsc::UnboundedSender<bool>,
}

impl ScannerHandle {
    /// Request the scan loop to stop.
    ///
    /// Observed at the loop's next turn: an in-flight validation still
    /// completes and reports, but no further frames are decoded.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Toggle the torch on the active track, if it has one.
    pub fn set_torch(&self, on: bool) {
        let _ = self.torch.send(on);
    }
}

/// The continuous camera scanning frontend for one operator.
pub struct CameraScanner {
    camera: Arc<dyn Camera>,
    decoder: Arc<dyn FrameDecoder>,
    gatekeeper: Gatekeeper,
    selection: DeviceSelection,
    phase: watch::Sender<CameraPhase>,
    stop_rx: watch::Receiver<bool>,
    torch_rx: mpsc::UnboundedReceiver<bool>,
    reports: mpsc::UnboundedSender<ScanReport>,
}

impl CameraScanner {
    /// Build a scanner and its control handle.
    ///
    /// Forwarded (non-suppressed) scan reports are delivered on
    /// `reports`; suppressed frame triggers are swallowed silently, as at
    /// camera frame rates they are pure noise.
    #[must_use]
    pub fn new(
        camera: Arc<dyn Camera>,
        decoder: Arc<dyn FrameDecoder>,
        gatekeeper: Gatekeeper,
        selection: DeviceSelection,
        reports: mpsc::UnboundedSender<ScanReport>,
    ) -> (Self, ScannerHandle) {
        let (phase, _) = watch::channel(CameraPhase::Idle);
        let (stop_tx, stop_rx) = watch::channel(false);
        let (torch_tx, torch_rx) = mpsc::unbounded_channel();

        let handle = ScannerHandle {
            stop: Arc::new(stop_tx),
            torch: torch_tx,
        };

        (
            Self {
                camera,
                decoder,
                gatekeeper,
                selection,
                phase,
                stop_rx,
                torch_rx,
                reports,
            },
            handle,
        )
    }

    /// Subscribe to phase changes (UI state, tests).
    #[must_use]
    pub fn phases(&self) -> watch::Receiver<CameraPhase> {
        self.phase.subscribe()
    }

    /// Run the scan loop until stopped or the device becomes unusable.
    ///
    /// Returns the gatekeeper so the caller keeps the session history.
    /// The final phase (readable via [`phases`]) distinguishes a clean
    /// stop from an unavailable device.
    ///
    /// [`phases`]: CameraScanner::phases
    pub async fn run(self) -> Gatekeeper {
        let Self {
            camera,
            decoder,
            mut gatekeeper,
            selection,
            phase,
            mut stop_rx,
            mut torch_rx,
            reports,
        } = self;

        phase.send_replace(CameraPhase::RequestingPermission);
        let mut track = match camera.acquire(&selection).await {
            Ok(track) => track,
            Err(err) => {
                tracing::warn!(error = %err, "camera unavailable");
                phase.send_replace(CameraPhase::Unavailable(err));
                return gatekeeper;
            }
        };

        tracing::info!(?selection, "camera streaming");
        phase.send_replace(CameraPhase::Streaming);

        loop {
            tokio::select! {
                biased;

                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }

                Some(on) = torch_rx.recv() => {
                    match track.set_torch(on) {
                        Ok(()) => tracing::debug!(on, "torch toggled"),
                        Err(err) => tracing::debug!(error = %err, "torch toggle refused"),
                    }
                }

                frame = track.next_frame() => {
                    let Some(frame) = frame else {
                        tracing::warn!("camera track ended");
                        drop(track);
                        phase.send_replace(CameraPhase::Unavailable(DeviceError::Failed(
                            "camera stream ended".to_string(),
                        )));
                        return gatekeeper;
                    };

                    if let Some(code) = decoder.decode(&frame) {
                        phase.send_replace(CameraPhase::Validating);
                        let report = gatekeeper.submit(&code).await;
                        if !report.is_suppressed() {
                            let _ = reports.send(report);
                        }
                        phase.send_replace(CameraPhase::Streaming);
                    }
                }
            }

            if *stop_rx.borrow() {
                break;
            }
        }

        // Dropping the track is the synchronous device release.
        drop(track);
        tracing::info!("camera scanner stopped");
        phase.send_replace(CameraPhase::Stopped);
        gatekeeper
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::feedback::SilentFeedback;
    use crate::session::ScanSession;
    use matchday_core::environment::Clock;
    use matchday_core::types::{OperatorId, PaymentStatus, TicketOrder, TicketOrderId, TicketType};
    use matchday_core::validator::Validator;
    use matchday_testing::{FixedClock, InMemoryGateStore, test_clock};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn frame_with(code: &str) -> Frame {
        Frame {
            width: 640,
            height: 480,
            luma: code.as_bytes().to_vec(),
        }
    }

    /// Decoder that treats the luma buffer as a UTF-8 payload.
    struct PassthroughDecoder;

    impl FrameDecoder for PassthroughDecoder {
        fn decode(&self, frame: &Frame) -> Option<String> {
            let text = String::from_utf8(frame.luma.clone()).ok()?;
            (!text.is_empty()).then_some(text)
        }
    }

    struct ScriptedTrack {
        frames: VecDeque<Frame>,
        released: Arc<AtomicBool>,
        torch: bool,
    }

    impl CameraTrack for ScriptedTrack {
        fn next_frame(&mut self) -> Pin<Box<dyn Future<Output = Option<Frame>> + Send + '_>> {
            let frame = self.frames.pop_front();
            Box::pin(async move {
                match frame {
                    Some(frame) => Some(frame),
                    // Script exhausted: block like a live camera between frames
                    None => std::future::pending().await,
                }
            })
        }

        fn torch_supported(&self) -> bool {
            true
        }

        fn set_torch(&mut self, on: bool) -> Result<(), DeviceError> {
            self.torch = on;
            Ok(())
        }
    }

    impl Drop for ScriptedTrack {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    struct ScriptedCamera {
        frames: Mutex<Option<VecDeque<Frame>>>,
        released: Arc<AtomicBool>,
        failure: Option<DeviceError>,
    }

    impl ScriptedCamera {
        fn with_frames(frames: Vec<Frame>) -> (Arc<Self>, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            (
                Arc::new(Self {
                    frames: Mutex::new(Some(frames.into())),
                    released: Arc::clone(&released),
                    failure: None,
                }),
                released,
            )
        }

        fn failing(failure: DeviceError) -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(None),
                released: Arc::new(AtomicBool::new(false)),
                failure: Some(failure),
            })
        }
    }

    impl Camera for ScriptedCamera {
        fn acquire(
            &self,
            _selection: &DeviceSelection,
        ) -> Pin<Box<dyn Future<Output = Result<Box<dyn CameraTrack>, DeviceError>> + Send + '_>>
        {
            Box::pin(async move {
                if let Some(failure) = &self.failure {
                    return Err(failure.clone());
                }
                let frames = self.frames.lock().unwrap().take().unwrap_or_default();
                Ok(Box::new(ScriptedTrack {
                    frames,
                    released: Arc::clone(&self.released),
                    torch: false,
                }) as Box<dyn CameraTrack>)
            })
        }
    }

    fn gatekeeper_over(store: &InMemoryGateStore, clock: &FixedClock) -> Gatekeeper {
        let clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let validator = Validator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::clone(&clock),
        );
        let session = ScanSession::camera(OperatorId::new(), Arc::clone(&clock));
        Gatekeeper::new(validator, session, Arc::new(SilentFeedback), clock)
    }

    fn paid_order() -> TicketOrder {
        TicketOrder {
            id: TicketOrderId::new(),
            ticket_type: TicketType {
                name: "North Stand".to_string(),
                match_info: None,
            },
            quantity: 1,
            payment_status: PaymentStatus::Completed,
            customer_name: "Kim".to_string(),
        }
    }

    #[tokio::test]
    async fn permission_denial_is_terminal_and_specific() {
        let store = InMemoryGateStore::new();
        let clock = test_clock();
        let camera = ScriptedCamera::failing(DeviceError::PermissionDenied);
        let (reports_tx, _reports_rx) = mpsc::unbounded_channel();

        let (scanner, _handle) = CameraScanner::new(
            camera,
            Arc::new(PassthroughDecoder),
            gatekeeper_over(&store, &clock),
            DeviceSelection::Default,
            reports_tx,
        );
        let phases = scanner.phases();

        scanner.run().await;

        assert_eq!(
            *phases.borrow(),
            CameraPhase::Unavailable(DeviceError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn held_up_ticket_forwards_once_within_cooldown() {
        let store = InMemoryGateStore::new();
        let order = paid_order();
        let code = order.id.to_string();
        store.insert_order(order);
        let clock = test_clock();

        // The same ticket sits in frame for five consecutive frames.
        let frames = (0..5).map(|_| frame_with(&code)).collect();
        let (camera, _released) = ScriptedCamera::with_frames(frames);
        let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();

        let (scanner, handle) = CameraScanner::new(
            camera,
            Arc::new(PassthroughDecoder),
            gatekeeper_over(&store, &clock),
            DeviceSelection::Default,
            reports_tx,
        );

        let task = tokio::spawn(scanner.run());
        let report = reports_rx.recv().await.unwrap();
        assert!(report.is_accepted());

        handle.stop();
        let gatekeeper = task.await.unwrap();

        // One forwarded attempt; the other four frames were debounced.
        assert_eq!(gatekeeper.history().totals().attempts, 1);
        assert_eq!(store.scan_count(), 1);
        assert!(reports_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_releases_the_device_and_reports_stopped() {
        let store = InMemoryGateStore::new();
        let clock = test_clock();
        let (camera, released) = ScriptedCamera::with_frames(vec![]);
        let (reports_tx, _reports_rx) = mpsc::unbounded_channel();

        let (scanner, handle) = CameraScanner::new(
            camera,
            Arc::new(PassthroughDecoder),
            gatekeeper_over(&store, &clock),
            DeviceSelection::Default,
            reports_tx,
        );
        let phases = scanner.phases();

        let task = tokio::spawn(scanner.run());

        // Wait for streaming before stopping
        let mut phases_wait = phases.clone();
        while *phases_wait.borrow() != CameraPhase::Streaming {
            phases_wait.changed().await.unwrap();
        }

        handle.stop();
        task.await.unwrap();

        assert_eq!(*phases.borrow(), CameraPhase::Stopped);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unreadable_frames_are_ignored() {
        let store = InMemoryGateStore::new();
        let order = paid_order();
        let code = order.id.to_string();
        store.insert_order(order);
        let clock = test_clock();

        let frames = vec![
            Frame {
                width: 640,
                height: 480,
                luma: vec![0xFF, 0xFE], // not UTF-8, decoder yields nothing
            },
            frame_with(&code),
        ];
        let (camera, _released) = ScriptedCamera::with_frames(frames);
        let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();

        let (scanner, handle) = CameraScanner::new(
            camera,
            Arc::new(PassthroughDecoder),
            gatekeeper_over(&store, &clock),
            DeviceSelection::Default,
            reports_tx,
        );

        let task = tokio::spawn(scanner.run());
        let report = reports_rx.recv().await.unwrap();
        assert!(report.is_accepted());

        handle.stop();
        let gatekeeper = task.await.unwrap();
        assert_eq!(gatekeeper.history().totals().attempts, 1);
    }
}
