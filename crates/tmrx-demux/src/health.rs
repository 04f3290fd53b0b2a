use std::time::{Duration, Instant};

/// CRC failure tracking and runtime clock for one link session.
#[derive(Debug, Clone)]
pub struct LinkHealth {
    started: Instant,
    last_crc: Option<u32>,
    crc_failures: u64,
}

impl LinkHealth {
    /// Start the runtime clock now, with no CRC baseline yet.
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Start the runtime clock at `started`.
    pub fn started_at(started: Instant) -> Self {
        Self {
            started,
            last_crc: None,
            crc_failures: 0,
        }
    }

    /// Feed the link's current CRC failure count and return how many new
    /// failures occurred since the previous sample.
    ///
    /// The first sample only sets the baseline. The driver counter is a
    /// wrapping `u32`.
    pub fn sample(&mut self, count: u32) -> u32 {
        let delta = match self.last_crc {
            Some(prev) => count.wrapping_sub(prev),
            None => 0,
        };
        self.last_crc = Some(count);
        self.crc_failures += u64::from(delta);
        delta
    }

    /// Wall-clock time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// CRC failures seen since the baseline.
    pub fn crc_failures(&self) -> u64 {
        self.crc_failures
    }

    /// Last raw counter value sampled.
    pub fn last_crc(&self) -> Option<u32> {
        self.last_crc
    }
}

impl Default for LinkHealth {
    fn default() -> Self {
        Self::new()
    }
}
