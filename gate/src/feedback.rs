//! Operator feedback: audible tones with haptic fallback.
//!
//! Every forwarded validation attempt produces an immediate, distinct
//! signal so the operator never has to read a screen mid-queue. Feedback
//! is strictly best-effort: a broken speaker must never fail a scan, so
//! everything here swallows errors after logging them at debug level.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Tone frequency for an accepted scan (high, friendly).
pub const ACCEPT_TONE_HZ: u32 = 880;

/// Tone frequency for a refused or errored scan (low, unmistakable).
pub const REJECT_TONE_HZ: u32 = 220;

/// Length of a single feedback tone.
pub const TONE_LENGTH: Duration = Duration::from_millis(150);

/// Vibration pattern for a refused scan: two short pulses.
pub const REJECT_PULSES: [Duration; 2] = [Duration::from_millis(80), Duration::from_millis(80)];

/// Vibration pattern for an accepted scan: one pulse.
pub const ACCEPT_PULSES: [Duration; 1] = [Duration::from_millis(120)];

/// The two cues the gate distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackCue {
    /// Holder admitted
    Accepted,
    /// Holder refused, or the attempt errored
    Rejected,
}

/// A feedback channel was unavailable or failed mid-signal.
#[derive(Error, Debug, Clone)]
#[error("feedback unavailable: {0}")]
pub struct FeedbackError(pub String);

/// Something that can play a tone (device speaker, piezo buzzer).
pub trait ToneSink: Send + Sync {
    /// Play a tone at the given frequency for the given duration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError`] if audio output is unavailable.
    fn play(&self, frequency_hz: u32, length: Duration) -> Result<(), FeedbackError>;
}

/// Something that can vibrate (phone, wearable scanner grip).
pub trait HapticSink: Send + Sync {
    /// Run a pulse pattern.
    ///
    /// # Errors
    ///
    /// Returns [`FeedbackError`] if haptics are unavailable.
    fn pulse(&self, pattern: &[Duration]) -> Result<(), FeedbackError>;
}

/// Cue dispatcher the frontends call after every forwarded attempt.
///
/// Implementations must be infallible from the caller's point of view:
/// signal delivery problems are theirs to absorb.
pub trait OperatorFeedback: Send + Sync {
    /// Emit the cue. Must never panic, block meaningfully, or error.
    fn signal(&self, cue: FeedbackCue);
}

/// Standard gate feedback: tone first, haptics when audio is unavailable.
///
/// Muting silences the tone channel only; haptic fallback still fires so
/// a muted device keeps giving the operator something physical.
pub struct GateChime {
    tones: Option<Arc<dyn ToneSink>>,
    haptics: Option<Arc<dyn HapticSink>>,
    muted: AtomicBool,
}

impl GateChime {
    /// Build a chime over whichever channels the device offers.
    #[must_use]
    pub const fn new(tones: Option<Arc<dyn ToneSink>>, haptics: Option<Arc<dyn HapticSink>>) -> Self {
        Self {
            tones,
            haptics,
            muted: AtomicBool::new(false),
        }
    }

    /// Mute or unmute the tone channel.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Whether the tone channel is muted.
    #[must_use]
    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    fn try_tone(&self, cue: FeedbackCue) -> bool {
        if self.is_muted() {
            return false;
        }
        let Some(tones) = &self.tones else {
            return false;
        };
        let frequency = match cue {
            FeedbackCue::Accepted => ACCEPT_TONE_HZ,
            FeedbackCue::Rejected => REJECT_TONE_HZ,
        };
        match tones.play(frequency, TONE_LENGTH) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "tone feedback failed");
                false
            }
        }
    }

    fn try_haptics(&self, cue: FeedbackCue) {
        let Some(haptics) = &self.haptics else {
            return;
        };
        let pattern: &[Duration] = match cue {
            FeedbackCue::Accepted => &ACCEPT_PULSES,
            FeedbackCue::Rejected => &REJECT_PULSES,
        };
        if let Err(err) = haptics.pulse(pattern) {
            tracing::debug!(error = %err, "haptic feedback failed");
        }
    }
}

impl OperatorFeedback for GateChime {
    fn signal(&self, cue: FeedbackCue) {
        if !self.try_tone(cue) {
            self.try_haptics(cue);
        }
    }
}

/// No-op feedback for tests and headless tooling.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentFeedback;

impl OperatorFeedback for SilentFeedback {
    fn signal(&self, _cue: FeedbackCue) {}
}
