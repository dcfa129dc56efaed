//! Hardware scanner detection from keystroke timing.
//!
//! USB and Bluetooth barcode scanners present themselves as keyboards and
//! type a whole code within a few milliseconds. A human cannot type several
//! characters inside the debounce window, so a burst of at least
//! `min_length` characters followed by a quiet debounce window is treated as
//! a scan. Enter ends a burst immediately, whatever its length.
//!
//! The heuristic looks only at timing. A fast paste of `min_length` or more
//! characters is indistinguishable from a scanner and will be emitted.
//!
//! [`KeystrokeDetector`] is the pure state machine; a spawned task drives it
//! from a key channel while the panel is open.

use tillscan_core::constants::KEY_CHANNEL_CAPACITY;
use tillscan_core::{ScanEvent, ScanSource};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};
use tracing::{debug, trace};

use crate::config::KeystrokeConfig;
use crate::events::Emitter;

/// Logical key reported by the host keyboard handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A single character.
    Char(char),
    Enter,
    Escape,
    /// Arrows, function keys and anything else without text.
    Other,
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Shift only.
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    /// Ctrl only.
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    /// Whether a shortcut modifier (anything but Shift) is held.
    pub fn command_held(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::default())
    }

    pub fn enter() -> Self {
        Self::new(Key::Enter, Modifiers::default())
    }

    pub fn escape() -> Self {
        Self::new(Key::Escape, Modifiers::default())
    }

    pub fn other() -> Self {
        Self::new(Key::Other, Modifiers::default())
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// The character this press types into a buffer, if any.
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(c) if !c.is_control() && !self.modifiers.command_held() => Some(c),
            _ => None,
        }
    }
}

/// Characters typed since the last emission or reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeystrokeBuffer {
    pub characters: String,
    pub last_event_at: Option<Instant>,
}

impl KeystrokeBuffer {
    fn push(&mut self, c: char, now: Instant) {
        self.characters.push(c);
        self.last_event_at = Some(now);
    }

    /// Number of buffered characters.
    pub fn len(&self) -> usize {
        self.characters.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    fn take(&mut self) -> String {
        self.last_event_at = None;
        std::mem::take(&mut self.characters)
    }

    fn clear(&mut self) {
        self.characters.clear();
        self.last_event_at = None;
    }
}

/// Burst detector state machine.
///
/// Time is passed in, so the detector can be driven by a real clock or by a
/// test.
///
/// # Examples
///
/// ```
/// use tokio::time::{Duration, Instant};
/// use tillscan_scanner::config::KeystrokeConfig;
/// use tillscan_scanner::keystroke::{KeyEvent, KeystrokeDetector};
///
/// let mut detector = KeystrokeDetector::new(KeystrokeConfig::default());
/// let now = Instant::now();
///
/// for c in "4006381333931".chars() {
///     assert!(detector.on_key(&KeyEvent::char(c), now).is_none());
/// }
///
/// let scan = detector.on_deadline(now + Duration::from_millis(100)).unwrap();
/// assert_eq!(scan.text(), "4006381333931");
/// ```
#[derive(Debug, Clone)]
pub struct KeystrokeDetector {
    config: KeystrokeConfig,
    buffer: KeystrokeBuffer,
    deadline: Option<Instant>,
}

impl KeystrokeDetector {
    pub fn new(config: KeystrokeConfig) -> Self {
        Self {
            config,
            buffer: KeystrokeBuffer::default(),
            deadline: None,
        }
    }

    /// Feed one key press.
    ///
    /// A press arriving after the debounce window closed first completes the
    /// previous burst, so the returned scan may be that burst. Otherwise a
    /// scan is returned only when Enter ends a non-empty burst.
    pub fn on_key(&mut self, event: &KeyEvent, now: Instant) -> Option<ScanEvent> {
        let completed = self.on_deadline(now);

        if let Some(c) = event.printable() {
            self.buffer.push(c, now);
            self.deadline = Some(now + self.config.debounce);
            trace!(buffered = self.buffer.len(), "keystroke buffered");
            return completed;
        }

        match event.key {
            Key::Enter if !self.buffer.is_empty() => {
                self.deadline = None;
                ScanEvent::new(&self.buffer.take(), ScanSource::Keystroke)
            }
            Key::Escape => {
                self.reset();
                completed
            }
            _ => completed,
        }
    }

    /// Handle the debounce window closing.
    ///
    /// Bursts shorter than `min_length` are discarded. Calling this before
    /// the deadline has no effect.
    pub fn on_deadline(&mut self, now: Instant) -> Option<ScanEvent> {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return None,
        }
        self.deadline = None;

        let length = self.buffer.len();
        let text = self.buffer.take();
        if length < self.config.min_length {
            debug!(length, "short keystroke burst discarded");
            return None;
        }
        ScanEvent::new(&text, ScanSource::Keystroke)
    }

    /// When the current burst will be considered complete.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn buffer(&self) -> &KeystrokeBuffer {
        &self.buffer
    }

    /// Drop the buffered burst without emitting.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }
}

/// Live key subscription for one open panel.
///
/// Dropping the subscription stops its task and discards any partial burst.
#[derive(Debug)]
pub(crate) struct KeystrokeSubscription {
    tx: mpsc::Sender<KeyEvent>,
    task: JoinHandle<()>,
}

impl KeystrokeSubscription {
    /// Spawn the detector task. Must be called inside a Tokio runtime.
    pub(crate) fn arm(config: KeystrokeConfig, events: Emitter) -> Self {
        let (tx, rx) = mpsc::channel(KEY_CHANNEL_CAPACITY);
        let task = tokio::spawn(drive(KeystrokeDetector::new(config), rx, events));
        debug!("keystroke detector armed");
        Self { tx, task }
    }

    /// Queue a key press for the detector.
    pub(crate) fn feed(&self, event: KeyEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(error) => {
                debug!(%error, "key press dropped");
                false
            }
        }
    }
}

impl Drop for KeystrokeSubscription {
    fn drop(&mut self) {
        self.task.abort();
        debug!("keystroke detector disarmed");
    }
}

async fn drive(
    mut detector: KeystrokeDetector,
    mut keys: mpsc::Receiver<KeyEvent>,
    events: Emitter,
) {
    loop {
        let deadline = detector.deadline();
        // select! builds every branch future even when its guard is false
        let wake = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            biased;

            () = sleep_until(wake), if deadline.is_some() => {
                if let Some(scan) = detector.on_deadline(Instant::now()) {
                    events.scan(scan);
                }
            }
            key = keys.recv() => match key {
                Some(event) => {
                    if let Some(scan) = detector.on_key(&event, Instant::now()) {
                        events.scan(scan);
                    }
                }
                None => break,
            },
        }
    }
}
