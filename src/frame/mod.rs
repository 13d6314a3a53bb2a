//! Frame scheduling: a tick callback registered once and driven by a
//! host-provided clock until stopped.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// One display refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Frames delivered before this one.
    pub index: u64,
    /// Time since the clock started.
    pub elapsed: Duration,
}

/// Source of frames. `None` means the clock has shut down.
pub trait FrameClock {
    fn next_frame(&mut self) -> impl Future<Output = Option<FrameTime>>;
}

/// Fixed-rate clock on the tokio timer. Late frames are skipped rather than
/// replayed in a burst.
pub struct IntervalClock {
    interval: Interval,
    started: Instant,
    index: u64,
}

impl IntervalClock {
    pub fn new(frames_per_second: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(frames_per_second.max(1)));
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        IntervalClock {
            interval,
            started: Instant::now(),
            index: 0,
        }
    }
}

impl FrameClock for IntervalClock {
    async fn next_frame(&mut self) -> Option<FrameTime> {
        let now = self.interval.tick().await;
        let frame = FrameTime {
            index: self.index,
            elapsed: now.saturating_duration_since(self.started),
        };
        self.index += 1;
        Some(frame)
    }
}

/// Delivers a fixed number of frames back to back, then shuts down.
#[derive(Debug, Clone)]
pub struct FixedFrames {
    remaining: u64,
    index: u64,
    step: Duration,
}

impl FixedFrames {
    pub fn new(count: u64, step: Duration) -> Self {
        FixedFrames {
            remaining: count,
            index: 0,
            step,
        }
    }
}

impl FrameClock for FixedFrames {
    async fn next_frame(&mut self) -> Option<FrameTime> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        // let other tasks run between frames, as a display refresh would
        tokio::task::yield_now().await;
        let frame = FrameTime {
            index: self.index,
            elapsed: self
                .step
                .saturating_mul(u32::try_from(self.index).unwrap_or(u32::MAX)),
        };
        self.index += 1;
        Some(frame)
    }
}

/// Cancels a running [`FrameLoop`]. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// What the tick callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct FrameLoop<F> {
    tick: F,
    stop: StopHandle,
}

impl<F> FrameLoop<F>
where
    F: FnMut(FrameTime) -> Flow,
{
    pub fn new(tick: F) -> (Self, StopHandle) {
        let stop = StopHandle::default();
        (
            FrameLoop {
                tick,
                stop: stop.clone(),
            },
            stop,
        )
    }

    /// Runs until stopped, the callback returns [`Flow::Stop`], or the clock
    /// runs out. Returns the number of frames ticked.
    pub async fn run<C: FrameClock>(mut self, clock: &mut C) -> u64 {
        let mut ticked = 0;
        while !self.stop.is_stopped() {
            let Some(frame) = clock.next_frame().await else {
                break;
            };
            if self.stop.is_stopped() {
                break;
            }
            ticked += 1;
            if (self.tick)(frame) == Flow::Stop {
                break;
            }
        }
        debug!("frame loop ended after {ticked} frames");
        ticked
    }
}
