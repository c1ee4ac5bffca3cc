use crate::tick::Tick;

/// Ticks of drift between the estimate and its target before the estimate
/// snaps instead of slewing.
const SNAP_TOLERANCE: u32 = 10;

/// Estimates the remote host's current tick from the newest tick seen in
/// its packets plus an RTT-derived in-flight offset.
///
/// The estimate advances by one every local update and free-runs through
/// silence; only a freshly received remote tick adjusts it, a tick at a
/// time for small drift and a snap for large drift. The consumer sees
/// monotonic-ish time with occasional held or doubled steps.
pub struct RemoteClock {
    latest_remote: Tick,
    estimated_remote: Tick,
    delay_ticks: u32,
    pending_adjust: bool,
}

impl RemoteClock {
    pub fn new(default_delay_ticks: u32) -> Self {
        Self {
            latest_remote: Tick::INVALID,
            estimated_remote: Tick::INVALID,
            delay_ticks: default_delay_ticks.max(1),
            pending_adjust: false,
        }
    }

    pub fn latest_remote(&self) -> Tick {
        self.latest_remote
    }

    pub fn estimated_remote(&self) -> Tick {
        self.estimated_remote
    }

    /// Records the sender tick of a freshly received packet.
    pub fn record_remote(&mut self, tick: Tick) {
        if !tick.is_valid() {
            return;
        }
        if !self.latest_remote.is_valid() || tick > self.latest_remote {
            self.latest_remote = tick;
            self.pending_adjust = true;
        }
    }

    /// Advances the estimate by one local tick, adjusting toward the
    /// latest remote tick plus the in-flight offset when fresh data
    /// arrived since the last update.
    pub fn update(&mut self, ping: Option<f32>, tick_duration: f32) {
        if let Some(ping) = ping {
            if ping >= 0.0 && tick_duration > 0.0 {
                self.delay_ticks = ((ping * 0.5 / tick_duration).round() as u32).max(1);
            }
        }

        if !self.latest_remote.is_valid() {
            return;
        }
        let desired = self.latest_remote.add(self.delay_ticks);

        if !self.estimated_remote.is_valid() {
            self.estimated_remote = desired;
            self.pending_adjust = false;
            return;
        }

        let advanced = self.estimated_remote.next();
        if !self.pending_adjust {
            // Silence: free-run.
            self.estimated_remote = advanced;
            return;
        }
        self.pending_adjust = false;

        self.estimated_remote = if advanced == desired {
            advanced
        } else if advanced < desired {
            if desired.since(advanced).unwrap_or(0) > SNAP_TOLERANCE {
                desired
            } else {
                // Behind: catch up one extra tick.
                advanced.next()
            }
        } else if advanced.since(desired).unwrap_or(0) > SNAP_TOLERANCE {
            desired
        } else {
            // Slightly ahead: hold this update.
            self.estimated_remote
        };
    }
}
