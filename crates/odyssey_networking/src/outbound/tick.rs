//! # Send Cadence
//!
//! Frame counters that decide which outbound samplers run on a given frame,
//! and a pacer that stands in for the game's frame hook in headless drivers.
//!
//! Inside the game the frame hook drives [`Cadence::advance`] directly.

use std::time::{Duration, Instant};

/// Sleeps a headless driver from one game frame to the next.
///
/// Frames that are already past due when the driver comes back are skipped
/// and counted, so a stalled driver resumes at the current frame instead of
/// running a burst of updates.
#[derive(Debug)]
pub struct FramePacer {
    frame: Duration,
    next: Instant,
    frames: u64,
    skipped: u64,
}

impl FramePacer {
    /// Paces `frame_rate` frames per second. A rate of 0 is treated as 1.
    #[must_use]
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame: Duration::from_micros(1_000_000 / u64::from(frame_rate.max(1))),
            next: Instant::now(),
            frames: 0,
            skipped: 0,
        }
    }

    /// Blocks until the next frame is due. Returns its frame number,
    /// starting at 1.
    pub fn wait(&mut self) -> u64 {
        let now = Instant::now();
        match self.next.checked_duration_since(now) {
            Some(remaining) => std::thread::sleep(remaining),
            None => {
                let behind = now.duration_since(self.next);
                let missed = behind.as_micros() / self.frame.as_micros().max(1);
                self.skipped += u64::try_from(missed).unwrap_or(u64::MAX);
                self.next = now;
            }
        }
        self.next += self.frame;
        self.frames += 1;
        self.frames
    }

    /// True on every `period`-th frame. A period of 0 never fires.
    #[must_use]
    pub const fn every(&self, period: u64) -> bool {
        period != 0 && self.frames % period == 0
    }

    /// Frames run.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames dropped because the driver fell behind.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Target frame length.
    #[must_use]
    pub const fn frame_duration(&self) -> Duration {
        self.frame
    }
}

/// Which sampler groups fire on a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CadenceTick {
    /// Player, cap and capture info.
    pub fast: bool,
    /// Game info and deathlink housekeeping.
    pub slow: bool,
    /// Full shine resync.
    pub resync: bool,
}

/// Independent tick counters for each send cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    fast_interval: u32,
    slow_interval: u32,
    resync_interval: u32,
    fast: u32,
    slow: u32,
    resync: u32,
}

impl Cadence {
    /// Creates counters. Zero intervals are treated as 1.
    #[must_use]
    pub fn new(fast_interval: u32, slow_interval: u32, resync_interval: u32) -> Self {
        Self {
            fast_interval: fast_interval.max(1),
            slow_interval: slow_interval.max(1),
            resync_interval: resync_interval.max(1),
            fast: 0,
            slow: 0,
            resync: 0,
        }
    }

    /// Counts one frame. A group fires every `interval` frames, starting
    /// with the first.
    pub fn advance(&mut self) -> CadenceTick {
        CadenceTick {
            fast: step(&mut self.fast, self.fast_interval),
            slow: step(&mut self.slow, self.slow_interval),
            resync: step(&mut self.resync, self.resync_interval),
        }
    }

    /// Makes every group fire on the next frame.
    pub fn reset(&mut self) {
        self.fast = 0;
        self.slow = 0;
        self.resync = 0;
    }
}

fn step(counter: &mut u32, interval: u32) -> bool {
    let fire = *counter == 0;
    *counter = (*counter + 1) % interval;
    fire
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert_eq!(FramePacer::new(60).frame_duration(), Duration::from_micros(16_666));
        assert_eq!(FramePacer::new(0).frame_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_pacer_counts_frames() {
        let mut pacer = FramePacer::new(1000);
        assert_eq!(pacer.wait(), 1);
        assert_eq!(pacer.wait(), 2);
        assert!(pacer.every(2));
        assert!(!pacer.every(3));
        assert!(!pacer.every(0));
    }

    #[test]
    fn test_stalled_pacer_skips_missed_frames() {
        let mut pacer = FramePacer::new(1000);
        pacer.wait();
        std::thread::sleep(Duration::from_millis(20));

        let before = Instant::now();
        pacer.wait();
        assert!(pacer.skipped() >= 5);
        assert_eq!(pacer.frames(), 2);

        pacer.wait();
        assert!(before.elapsed() < Duration::from_millis(15));
    }

    #[test]
    fn test_cadence_intervals() {
        let mut cadence = Cadence::new(3, 60, 1800);
        let ticks: Vec<CadenceTick> = (0..120).map(|_| cadence.advance()).collect();

        assert_eq!(ticks.iter().filter(|t| t.fast).count(), 40);
        assert_eq!(ticks.iter().filter(|t| t.slow).count(), 2);
        assert_eq!(ticks.iter().filter(|t| t.resync).count(), 1);
        assert!(ticks[0].fast && ticks[0].slow && ticks[0].resync);
        assert!(ticks[3].fast && !ticks[4].fast);
    }

    #[test]
    fn test_cadence_reset() {
        let mut cadence = Cadence::new(3, 60, 1800);
        cadence.advance();
        assert!(!cadence.advance().slow);
        cadence.reset();
        assert!(cadence.advance().slow);
    }
}
