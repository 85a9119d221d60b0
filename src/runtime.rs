use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use tracing::warn;

/// What the cooking loop reacts to
#[derive(Clone, Debug)]
pub enum CookEvent {
    Key(KeyEvent),
    Resize,
    /// Time to ask the session table how much wall clock has passed
    Tick,
    /// The event source is gone and no more input will arrive
    Closed,
}

/// Anything that can feed keyboard and resize events to the loop
pub trait CookEventSource: Send + 'static {
    /// Waits at most `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<CookEvent, RecvTimeoutError>;
}

fn translate(event: CtEvent) -> Option<CookEvent> {
    match event {
        // Windows reports releases too
        CtEvent::Key(key) if key.kind != KeyEventKind::Release => Some(CookEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(CookEvent::Resize),
        _ => None,
    }
}

/// Reads the terminal on a background thread and forwards over a channel.
pub struct CrosstermEventSource {
    rx: Receiver<CookEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "terminal event reader stopped");
                    return;
                }
            };
            if let Some(ev) = translate(event) {
                if tx.send(ev).is_err() {
                    return;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CookEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CookEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Cadence of [`CookEvent::Tick`]
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed source for headless runs
pub struct TestEventSource {
    rx: Receiver<CookEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<CookEvent>) -> Self {
        Self { rx }
    }
}

impl CookEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CookEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Merges terminal events with a steady tick.
pub struct Runner<E: CookEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: CookEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next event or the next tick deadline, whichever is first.
    ///
    /// Keystrokes do not push the tick back, so a busy keyboard cannot starve
    /// the timer. Once the source disconnects every call yields
    /// [`CookEvent::Closed`] and the caller is expected to stop.
    pub fn step(&mut self) -> CookEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            self.next_tick = now + self.ticker.interval();
            return CookEvent::Tick;
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                self.next_tick = Instant::now() + self.ticker.interval();
                CookEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => CookEvent::Closed,
        }
    }
}
