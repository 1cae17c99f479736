//! The per-frame control loop.
//!
//! One tick does, in order:
//!
//! 1. bail out if the session was canceled, skip if it is not ready
//! 2. clear the surface
//! 3. advance and draw every particle
//! 4. classify the current frame (failures count as "no detection")
//! 5. evaluate the trigger and spawn a burst at the trigger point
//!
//! Ticks never overlap. Between ticks the loop waits on a
//! [`FrameScheduler`]; the overlay window instead calls
//! [`RenderLoop::tick`] from its redraw handler.

use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;

use crate::classifier::GestureClassifier;
use crate::frame::FrameSource;
use crate::session::Session;
use crate::surface::DrawSurface;
use crate::time::{Clock, Time};

/// Loop lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Running,
    Stopped,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The frame was drawn. Carries the spawn point if a wave fired.
    Rendered { triggered: Option<Vec2> },
    /// Collaborators were not ready, or the loop was not started.
    Skipped,
    /// The loop is stopped; no further ticks will run.
    Stopped,
}

/// Yield point between ticks.
pub trait FrameScheduler {
    /// Block until the next frame is due. Called before every tick,
    /// including the first. Returns `false` when no more frames should run.
    fn wait_for_next_frame(&mut self) -> bool;
}

/// Paces ticks at a fixed rate by sleeping, optionally for a bounded number
/// of frames.
#[derive(Debug, Clone)]
pub struct FixedRateScheduler {
    interval: Duration,
    next_deadline: Option<Instant>,
    frame_limit: Option<u64>,
    frames: u64,
}

impl FixedRateScheduler {
    /// Schedule at `fps` frames per second. Non-positive rates, and rates
    /// too small to express as a frame interval, run unthrottled.
    pub fn new(fps: f32) -> Self {
        let interval = if fps > 0.0 {
            Duration::try_from_secs_f64(1.0 / fps as f64).unwrap_or_else(|_| {
                log::warn!("frame rate {} is out of range; running unthrottled", fps);
                Duration::ZERO
            })
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_deadline: None,
            frame_limit: None,
            frames: 0,
        }
    }

    /// Run as fast as possible.
    pub fn unthrottled() -> Self {
        Self::new(0.0)
    }

    /// Stop after `frames` ticks. A limit of zero runs no ticks at all.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for FixedRateScheduler {
    fn wait_for_next_frame(&mut self) -> bool {
        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            return false;
        }
        self.frames += 1;
        if self.interval.is_zero() {
            return true;
        }

        let now = Instant::now();
        // The first frame is due immediately.
        let Some(previous) = self.next_deadline else {
            self.next_deadline = Some(now);
            return true;
        };
        let deadline = previous + self.interval;
        if deadline > now {
            thread::sleep(deadline - now);
            self.next_deadline = Some(deadline);
        } else {
            // Fell behind; resynchronise instead of bursting.
            self.next_deadline = Some(now);
        }
        true
    }
}

/// Drives ticks over a [`Session`].
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    time: Time,
    spawns: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Uninitialized,
            time: Time::new(),
            spawns: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Frame timing statistics.
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Waves that spawned particles so far.
    pub fn spawn_count(&self) -> u64 {
        self.spawns
    }

    /// Move to `Running`.
    ///
    /// Fails if this loop was already started, or if another loop is already
    /// driving `session`.
    pub fn start<F, C, S, K>(&mut self, session: &mut Session<F, C, S, K>) -> bool
    where
        F: FrameSource,
        C: GestureClassifier,
        S: DrawSurface,
        K: Clock,
    {
        if self.state != LoopState::Uninitialized || session.loop_active || session.is_canceled() {
            return false;
        }
        session.loop_active = true;
        self.state = LoopState::Running;
        log::info!("render loop started");
        true
    }

    /// Move to `Stopped`. Later ticks return [`TickOutcome::Stopped`].
    pub fn stop<F, C, S, K>(&mut self, session: &mut Session<F, C, S, K>)
    where
        F: FrameSource,
        C: GestureClassifier,
        S: DrawSurface,
        K: Clock,
    {
        if self.state == LoopState::Running {
            session.loop_active = false;
            log::info!(
                "render loop stopped after {} frames, {} waves",
                self.time.frame(),
                self.spawns
            );
        }
        self.state = LoopState::Stopped;
    }

    /// Run one iteration.
    pub fn tick<F, C, S, K>(&mut self, session: &mut Session<F, C, S, K>) -> TickOutcome
    where
        F: FrameSource,
        C: GestureClassifier,
        S: DrawSurface,
        K: Clock,
    {
        match self.state {
            LoopState::Uninitialized => return TickOutcome::Skipped,
            LoopState::Stopped => return TickOutcome::Stopped,
            LoopState::Running => {}
        }
        if session.is_canceled() {
            self.stop(session);
            return TickOutcome::Stopped;
        }
        if !session.is_ready() {
            return TickOutcome::Skipped;
        }

        if self.time.update() {
            log::debug!(
                "{:.1} fps, {} particles",
                self.time.fps(),
                session.particles.len()
            );
        }

        let Session {
            frames,
            classifier,
            surface,
            particles,
            trigger,
            clock,
            last_frame,
            ..
        } = session;

        surface.clear();
        particles.advance_and_draw(surface);

        let Some(frame) = frames.as_mut().and_then(|f| f.current_frame()) else {
            return TickOutcome::Rendered { triggered: None };
        };
        let now = clock.now_ms();
        let result = classifier.classify(&frame, now);
        *last_frame = Some(frame);

        let triggered = trigger.evaluate(&result, now, surface.size());
        if let Some(point) = triggered {
            particles.burst(point);
            self.spawns += 1;
        }
        TickOutcome::Rendered { triggered }
    }

    /// Start, then tick until the session is canceled or `scheduler` runs
    /// out of frames. Returns the number of rendered ticks.
    pub fn run<F, C, S, K>(
        &mut self,
        session: &mut Session<F, C, S, K>,
        scheduler: &mut impl FrameScheduler,
    ) -> u64
    where
        F: FrameSource,
        C: GestureClassifier,
        S: DrawSurface,
        K: Clock,
    {
        if !self.start(session) {
            log::warn!("render loop not started: already running or session torn down");
            return 0;
        }

        let mut rendered = 0;
        while scheduler.wait_for_next_frame() {
            match self.tick(session) {
                TickOutcome::Stopped => break,
                TickOutcome::Rendered { .. } => rendered += 1,
                TickOutcome::Skipped => {}
            }
        }
        self.stop(session);
        rendered
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}
