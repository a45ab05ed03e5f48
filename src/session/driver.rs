use std::time::Duration;

use crate::eval::time::ManualClock;
use crate::foundation::error::StimResult;
use crate::present::surface::Surface;
use crate::session::engine::StimulusEngine;
use crate::session::refresh::ManualRefresh;

/// How a [`SyncDriver`] spaces frames in time.
#[derive(Debug, Clone)]
pub enum Pacing {
    /// Fire refreshes back to back without touching any clock.
    Unpaced,
    /// Advance a shared manual clock by the interval before each refresh.
    Simulated(ManualClock),
    /// Sleep the calling thread for the interval before each refresh.
    Realtime,
}

/// Synchronous stand-in for a display refresh loop: fires queued refreshes one at a time.
#[derive(Debug, Clone)]
pub struct SyncDriver {
    interval: Duration,
    pacing: Pacing,
}

impl SyncDriver {
    /// Driver with a refresh `interval` and the given pacing.
    pub fn new(interval: Duration, pacing: Pacing) -> Self {
        Self { interval, pacing }
    }

    /// Driver that fires refreshes at `hz` on a simulated clock.
    pub fn simulated(hz: f64, clock: ManualClock) -> Self {
        Self::new(refresh_interval(hz), Pacing::Simulated(clock))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fire up to `frames` refreshes, in request order.
    ///
    /// Stops early when the engine has nothing pending (paused or destroyed). Returns the number of
    /// frames actually presented.
    pub fn run<S: Surface>(
        &self,
        engine: &mut StimulusEngine<S, ManualRefresh>,
        frames: usize,
    ) -> StimResult<usize> {
        let mut presented = 0;
        for _ in 0..frames {
            let Some(ticket) = engine.scheduler_mut().next_due() else {
                break;
            };
            match &self.pacing {
                Pacing::Unpaced => {}
                Pacing::Simulated(clock) => clock.advance(self.interval),
                Pacing::Realtime => std::thread::sleep(self.interval),
            }
            if engine.on_refresh(ticket)? {
                presented += 1;
            }
        }
        Ok(presented)
    }
}

/// Fire up to `frames` queued refreshes back to back.
pub fn render_frames<S: Surface>(
    engine: &mut StimulusEngine<S, ManualRefresh>,
    frames: usize,
) -> StimResult<usize> {
    SyncDriver::new(Duration::ZERO, Pacing::Unpaced).run(engine, frames)
}

/// Refresh period for a rate in Hz. Non-positive or non-finite rates map to zero.
pub fn refresh_interval(hz: f64) -> Duration {
    if hz.is_finite() && hz > 0.0 {
        Duration::from_secs_f64(1.0 / hz)
    } else {
        Duration::ZERO
    }
}
