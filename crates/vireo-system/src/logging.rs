//! Flight log plumbing.
//!
//! The feedback loop pushes one record per armed tick into a bounded
//! channel; the log consumer drains it from its own context. Pushing never
//! blocks the ISR: a full queue drops the record and counts the loss.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use vireo_config::{LOG_QUEUE_DEPTH, MAX_ROTORS};

/// One snapshot of the controller, taken at the end of a tick.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogEntry {
    pub loop_index: u64,
    pub alt: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub v_batt: f32,
    pub u_thr: f32,
    pub u_roll: f32,
    pub u_pitch: f32,
    pub u_yaw: f32,
    pub u_x: f32,
    pub u_y: f32,
    pub motors: [f32; MAX_ROTORS],
}

pub type LogQueue = Channel<CriticalSectionRawMutex, LogEntry, LOG_QUEUE_DEPTH>;

/// Shared record queue for platforms running a single controller instance.
pub static LOG_CHANNEL: LogQueue = Channel::new();

/// Producer side of the flight log, owned by the feedback loop. Recording
/// is scoped to the arm cycle: `arm` starts it, `disarm` stops it.
pub struct FlightLogger {
    queue: &'static LogQueue,
    active: bool,
    dropped: u32,
}

impl FlightLogger {
    pub const fn new(queue: &'static LogQueue) -> Self {
        Self {
            queue,
            active: false,
            dropped: 0,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Records dropped because the consumer fell behind.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn push(&mut self, entry: LogEntry) {
        if !self.active {
            return;
        }
        if self.queue.try_send(entry).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_is_gated_on_start_stop() {
        static QUEUE: LogQueue = Channel::new();
        let mut logger = FlightLogger::new(&QUEUE);

        logger.push(LogEntry::default());
        assert!(QUEUE.try_receive().is_err());

        logger.start();
        logger.push(LogEntry {
            loop_index: 7,
            ..LogEntry::default()
        });
        assert_eq!(QUEUE.try_receive().unwrap().loop_index, 7);

        logger.stop();
        logger.push(LogEntry::default());
        assert!(QUEUE.try_receive().is_err());
    }

    #[test]
    fn full_queue_drops_and_counts() {
        static QUEUE: LogQueue = Channel::new();
        let mut logger = FlightLogger::new(&QUEUE);
        logger.start();

        for i in 0..(LOG_QUEUE_DEPTH as u64 + 3) {
            logger.push(LogEntry {
                loop_index: i,
                ..LogEntry::default()
            });
        }
        assert_eq!(logger.dropped(), 3);

        // The queue kept the oldest records in order.
        for i in 0..LOG_QUEUE_DEPTH as u64 {
            assert_eq!(QUEUE.try_receive().unwrap().loop_index, i);
        }
        assert!(QUEUE.try_receive().is_err());
    }
}
