//! Render driver for the lyric scroll preview
//!
//! Owns the active position over time. Every `step_period` the active line
//! advances to `(index + 1) % line_count` and a fresh [`Frame`] is computed and
//! handed to a [`FrameSink`]. With smoothing enabled, the driver also emits
//! sub-frames every `frame_period` in between, following the damped
//! [`FocusTransition`] toward the new line.
//!
//! The active position has exactly one writer (the driver task). Readers get
//! whole frames through a `watch` channel: a newer frame replaces the
//! previous one, frames never interleave.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::engine::{FocusTransition, Frame, LyricsEngine};

/// Receives every frame the driver produces
pub trait FrameSink: Send + 'static {
    fn render(&mut self, frame: &Frame);
}

/// Timing options for the driver
#[derive(Debug, Clone, PartialEq)]
pub struct DriverOptions {
    /// Line focused when the driver starts (wrapped into range)
    pub start_index: usize,
    /// Time between two line advances
    pub step_period: Duration,
    /// Sub-frame period for damped transitions; `None` renders integer
    /// positions only
    pub frame_period: Option<Duration>,
    /// Stop on its own after this many advances
    pub max_steps: Option<u64>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            start_index: 2,
            step_period: Duration::from_secs(2),
            frame_period: None,
            max_steps: None,
        }
    }
}

/// Active position state machine, free of any clock
///
/// Time is supplied by the caller as elapsed time since the driver started.
#[derive(Debug, Clone)]
pub struct ActiveCursor {
    index: usize,
    line_count: usize,
    step_period: Duration,
    damping: f64,
    transition: FocusTransition,
    /// Elapsed time of the last advance
    stepped_at: Duration,
    steps: u64,
}

impl ActiveCursor {
    pub fn new(start_index: usize, line_count: usize, step_period: Duration, damping: f64) -> Self {
        let line_count = line_count.max(1);
        let index = start_index % line_count;
        Self {
            index,
            line_count,
            step_period,
            damping,
            transition: FocusTransition::settled(index as f64, damping),
            stepped_at: Duration::ZERO,
            steps: 0,
        }
    }

    /// Current integer active line
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of advances so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance one line at `at`, wrapping to 0 after the last line
    pub fn advance(&mut self, at: Duration) {
        let from = self.smoothed_position(at);
        self.index = (self.index + 1) % self.line_count;
        self.transition = FocusTransition::new(from, self.index as f64, self.damping);
        self.stepped_at = at;
        self.steps += 1;
    }

    /// Apply every advance due by `elapsed`; returns how many happened
    pub fn poll(&mut self, elapsed: Duration) -> u64 {
        let mut advanced = 0;
        if self.step_period.is_zero() {
            return advanced;
        }
        while elapsed >= self.stepped_at + self.step_period {
            let at = self.stepped_at + self.step_period;
            self.advance(at);
            advanced += 1;
        }
        advanced
    }

    /// Active position at `elapsed`, following the damped transition
    pub fn smoothed_position(&self, elapsed: Duration) -> f64 {
        self.transition
            .position(elapsed.saturating_sub(self.stepped_at))
    }

    /// Active position as the reference preview requests it
    pub fn position(&self) -> f64 {
        self.index as f64
    }
}

/// What a finished driver run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSummary {
    pub frames: u64,
    pub steps: u64,
    pub final_index: usize,
}

/// Timer-driven re-render loop
#[derive(Debug, Clone)]
pub struct RenderDriver {
    engine: Arc<LyricsEngine>,
    options: DriverOptions,
}

impl RenderDriver {
    pub fn new(engine: Arc<LyricsEngine>, options: DriverOptions) -> Self {
        Self { engine, options }
    }

    /// Start the loop on the tokio runtime
    pub fn spawn<S: FrameSink>(self, sink: S) -> DriverHandle {
        let cursor = self.cursor();
        let initial = self.engine.frame(0, cursor.position());
        let (frame_tx, frame_rx) = watch::channel(initial);
        let (stop_tx, stop_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(cursor, sink, frame_tx, stop_rx));

        DriverHandle {
            frames: frame_rx,
            stop: Some(stop_tx),
            task,
        }
    }

    fn cursor(&self) -> ActiveCursor {
        ActiveCursor::new(
            self.options.start_index,
            self.engine.line_count(),
            self.options.step_period,
            self.engine.config().damping,
        )
    }

    async fn run<S: FrameSink>(
        self,
        mut cursor: ActiveCursor,
        mut sink: S,
        frame_tx: watch::Sender<Frame>,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> DriverSummary {
        let smooth = self.options.frame_period.is_some();
        let period = self
            .options
            .frame_period
            .unwrap_or(self.options.step_period)
            .max(Duration::from_millis(1));

        // Burst keeps the returned instants on the schedule, so elapsed time
        // (and therefore every step) stays deterministic under load
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        let mut origin: Option<Instant> = None;
        let mut frame = Frame {
            sequence: 0,
            active_position: cursor.position(),
            lines: Vec::with_capacity(self.engine.line_count()),
        };
        let mut sequence = 0u64;

        debug!(
            "Render driver started at line {} of {} (period {:?}, smooth: {})",
            cursor.index(),
            self.engine.line_count(),
            period,
            smooth
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    debug!("Render driver stopped");
                    break;
                }
                now = ticker.tick() => {
                    let start = *origin.get_or_insert(now);
                    let elapsed = now.duration_since(start);

                    if cursor.poll(elapsed) > 0 {
                        debug!("Active line -> {}", cursor.index());
                    }

                    let position = if smooth {
                        cursor.smoothed_position(elapsed)
                    } else {
                        cursor.position()
                    };
                    self.engine.fill_frame(&mut frame, sequence, position);
                    sink.render(&frame);
                    frame_tx.send_replace(frame.clone());
                    sequence += 1;

                    if self.options.max_steps.is_some_and(|max| cursor.steps() >= max) {
                        debug!("Render driver finished after {} steps", cursor.steps());
                        break;
                    }
                }
            }
        }

        DriverSummary {
            frames: sequence,
            steps: cursor.steps(),
            final_index: cursor.index(),
        }
    }
}

/// Control handle of a running driver
#[derive(Debug)]
pub struct DriverHandle {
    frames: watch::Receiver<Frame>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<DriverSummary>,
}

impl DriverHandle {
    /// Receiver of the most recent frame
    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frames.clone()
    }

    /// Cancel the timer; the in-flight evaluation (if any) completes first
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            // the task may already have finished on its own
            let _ = stop.send(());
        }
    }

    /// Wait for the loop to end
    pub async fn join(self) -> anyhow::Result<DriverSummary> {
        // keep `stop` alive until the task ends, dropping it would cancel
        let DriverHandle { stop, task, .. } = self;
        let summary = task.await?;
        drop(stop);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::settings::ScriptConfig;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Frame>>>);

    impl FrameSink for Recorder {
        fn render(&mut self, frame: &Frame) {
            self.0.lock().push(frame.clone());
        }
    }

    fn engine(lines: usize) -> Arc<LyricsEngine> {
        Arc::new(LyricsEngine::new(
            ScriptConfig::default().validated().unwrap(),
            lines,
        ))
    }

    #[test]
    fn test_cursor_wraps_after_last_line() {
        let mut cursor = ActiveCursor::new(5, 7, Duration::from_secs(2), 0.8);
        let mut seen = Vec::new();
        for k in 1..=4u64 {
            cursor.advance(Duration::from_secs(2 * k));
            seen.push(cursor.index());
        }
        assert_eq!(seen, [6, 0, 1, 2]);
        assert_eq!(cursor.steps(), 4);
    }

    #[test]
    fn test_cursor_start_index_is_wrapped() {
        let cursor = ActiveCursor::new(9, 7, Duration::from_secs(2), 0.8);
        assert_eq!(cursor.index(), 2);
        let single = ActiveCursor::new(3, 1, Duration::from_secs(2), 0.8);
        assert_eq!(single.index(), 0);
    }

    #[test]
    fn test_cursor_poll_follows_step_period() {
        let mut cursor = ActiveCursor::new(2, 7, Duration::from_secs(2), 0.8);
        assert_eq!(cursor.poll(Duration::from_millis(1999)), 0);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.poll(Duration::from_secs(2)), 1);
        assert_eq!(cursor.index(), 3);
        // late poll catches up on the steps due at 4 s, 6 s and 8 s
        assert_eq!(cursor.poll(Duration::from_secs(9)), 3);
        assert_eq!(cursor.index(), 6);
    }

    #[test]
    fn test_cursor_smoothed_position_moves_toward_new_line() {
        let mut cursor = ActiveCursor::new(2, 7, Duration::from_secs(2), 0.8);
        cursor.poll(Duration::from_secs(2));

        assert_eq!(cursor.smoothed_position(Duration::from_secs(2)), 2.0);
        let mid = cursor.smoothed_position(Duration::from_millis(2200));
        assert!(mid > 2.0 && mid < 3.0);
        let late = cursor.smoothed_position(Duration::from_secs(3));
        assert!(late > mid && late <= 3.0);
        assert_eq!(cursor.position(), 3.0);
    }

    #[tokio::test]
    async fn test_driver_renders_each_step() {
        let recorder = Recorder::default();
        let driver = RenderDriver::new(
            engine(7),
            DriverOptions {
                start_index: 5,
                step_period: Duration::from_millis(10),
                frame_period: None,
                max_steps: Some(3),
            },
        );

        let handle = driver.spawn(recorder.clone());
        let frames = handle.frames();
        let summary = handle.join().await.unwrap();

        assert_eq!(
            summary,
            DriverSummary {
                frames: 4,
                steps: 3,
                final_index: 1
            }
        );

        let recorded = recorder.0.lock();
        let positions: Vec<f64> = recorded.iter().map(|f| f.active_position).collect();
        assert_eq!(positions, [5.0, 6.0, 0.0, 1.0]);
        assert!(recorded.iter().all(|f| f.lines.len() == 7));
        assert_eq!(recorded[2].lines[0].offset_y, 0.0);
        assert!(recorded[2].lines[0].is_emphasized());

        let sequences: Vec<u64> = recorded.iter().map(|f| f.sequence).collect();
        assert_eq!(sequences, [0, 1, 2, 3]);
        assert_eq!(frames.borrow().sequence, 3);
    }

    #[tokio::test]
    async fn test_smooth_driver_emits_fractional_positions() {
        let recorder = Recorder::default();
        let driver = RenderDriver::new(
            engine(7),
            DriverOptions {
                start_index: 0,
                step_period: Duration::from_millis(40),
                frame_period: Some(Duration::from_millis(5)),
                max_steps: Some(2),
            },
        );

        let summary = driver.spawn(recorder.clone()).join().await.unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.final_index, 2);
        // ticks at 0, 5, .., 80 ms
        assert_eq!(summary.frames, 17);

        let recorded = recorder.0.lock();
        let positions: Vec<f64> = recorded.iter().map(|f| f.active_position).collect();

        // before the first step the focus rests on line 0
        assert!(positions[..8].iter().all(|&p| p == 0.0));
        // the frame at the step still starts from the old position
        assert_eq!(positions[8], 0.0);
        // in between it glides toward line 1 without reaching it
        let gliding = &positions[9..16];
        assert!(gliding.iter().all(|&p| p > 0.0 && p < 1.0));
        assert!(gliding.windows(2).all(|w| w[0] < w[1]));
        // the second step starts from wherever the glide was
        assert!(positions[16] > positions[15] && positions[16] < 1.0);
    }

    #[tokio::test]
    async fn test_stop_cancels_the_timer() {
        let recorder = Recorder::default();
        let driver = RenderDriver::new(
            engine(3),
            DriverOptions {
                step_period: Duration::from_secs(60),
                ..Default::default()
            },
        );

        let mut handle = driver.spawn(recorder.clone());
        let mut frames = handle.frames();
        // wait for the immediate first tick
        frames.changed().await.unwrap();
        handle.stop();
        let summary = handle.join().await.unwrap();

        assert_eq!(summary.steps, 0);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.final_index, 2);
        assert_eq!(recorder.0.lock().len(), 1);
    }
}
