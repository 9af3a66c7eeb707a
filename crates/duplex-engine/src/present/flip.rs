//! Flip submission and completion.
//!
//! The wait is the only place the backend blocks: it polls the hardware flip-status latch,
//! parking the thread between polls, until the previous flip has been scanned out.

use std::thread;
use std::time::Instant;

use crate::config::PollConfig;
use crate::device::{FlipStatus, GpuDevice};
use crate::error::{RenderError, Result};

use super::PresentationState;

/// Issues flips and waits for their completion.
#[derive(Debug, Copy, Clone, Default)]
pub struct FlipSync {
    poll: PollConfig,
}

impl FlipSync {
    pub fn new(poll: PollConfig) -> Self {
        Self { poll }
    }

    /// Queues a flip to the current buffer, dispatches it, and registers the wait token.
    ///
    /// On return `state.flip_in_flight()` is set; the buffer index is left unchanged.
    pub fn submit<D: GpuDevice + ?Sized>(&self, dev: &mut D, state: &mut PresentationState) {
        let index = state.current();
        dev.set_flip(index.get());
        dev.flush();
        dev.set_wait_flip();
        state.mark_flip_submitted();
        log::trace!("flip to buffer {} submitted", index.get());
    }

    /// Blocks until the hardware reports the flip retired, then resets the latch.
    ///
    /// Returns the number of polls it took. With a configured deadline, gives up with
    /// [`RenderError::FlipTimeout`] and leaves the latch untouched.
    pub fn wait_for_completion<D: GpuDevice + ?Sized>(&self, dev: &mut D) -> Result<u32> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            polls = polls.saturating_add(1);
            if dev.flip_status() == FlipStatus::Retired {
                break;
            }

            if let Some(deadline) = self.poll.deadline {
                if started.elapsed() >= deadline {
                    log::warn!("flip not retired after {deadline:?} ({polls} polls)");
                    return Err(RenderError::FlipTimeout(deadline));
                }
            }

            self.pause();
        }

        dev.reset_flip_status();
        log::trace!("flip retired after {polls} polls");
        Ok(polls)
    }

    /// Like [`wait_for_completion`](Self::wait_for_completion) but ignores the deadline.
    ///
    /// Teardown uses this: memory must not be released while the display may still read it.
    pub fn wait_unbounded<D: GpuDevice + ?Sized>(&self, dev: &mut D) -> u32 {
        let unbounded = FlipSync::new(PollConfig { deadline: None, ..self.poll });
        unbounded.wait_for_completion(dev).unwrap_or(0)
    }

    fn pause(&self) {
        if self.poll.interval.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(self.poll.interval);
        }
    }
}
