use std::time::Duration;

use tokio::time::Instant;

/// A polled one-shot timer.
#[derive(Debug, Default)]
pub struct Timer {
    started: Option<Instant>,
    deadline: Option<Instant>,
}

impl Timer {
    pub fn start(&mut self, now: Instant, duration: Duration) {
        self.started = Some(now);
        self.deadline = Some(now + duration);
    }

    pub fn stop(&mut self) {
        self.started = None;
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time since the timer was started.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started.map(|started| now.saturating_duration_since(started))
    }

    /// Returns true exactly once when the deadline has passed, stopping the
    /// timer.
    pub fn poll_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.stop();
                true
            }
            _ => false,
        }
    }
}

/// The ACK timer and its adaptive period.
///
/// The period doubles on every expiry and moves toward the measured round
/// trip time when an ACK arrives, staying within `[min, max]`.
#[derive(Debug)]
pub struct AckTimer {
    timer: Timer,
    period: Duration,
    init: Duration,
    min: Duration,
    max: Duration,
}

impl AckTimer {
    pub fn new(init: Duration, min: Duration, max: Duration) -> AckTimer {
        AckTimer {
            timer: Timer::default(),
            period: init.clamp(min, max),
            init,
            min,
            max,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn start_if_idle(&mut self, now: Instant) {
        if !self.timer.is_running() {
            self.timer.start(now, self.period);
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.timer.start(now, self.period);
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.timer.elapsed(now)
    }

    /// Returns true once on expiry, after backing the period off.
    pub fn poll_expired(&mut self, now: Instant) -> bool {
        if !self.timer.poll_expired(now) {
            return false;
        }
        self.period = (self.period * 2).min(self.max);
        true
    }

    /// Fold the round trip time of an acknowledged frame into the period.
    pub fn adapt(&mut self, rtt: Duration) {
        let period = (self.period * 7 + rtt * 2) / 8;
        self.period = period.clamp(self.min, self.max);
    }

    /// Forget everything learnt about the link.
    pub fn reset(&mut self) {
        self.timer.stop();
        self.period = self.init.clamp(self.min, self.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn it_expires_once() {
        let now = Instant::now();
        let mut timer = Timer::default();
        timer.start(now, ms(100));

        assert!(!timer.poll_expired(now + ms(99)));
        assert!(timer.poll_expired(now + ms(100)));
        assert!(!timer.poll_expired(now + ms(200)));
        assert!(!timer.is_running());
    }

    #[test]
    fn it_reports_elapsed_time() {
        let now = Instant::now();
        let mut timer = Timer::default();

        assert_eq!(timer.elapsed(now), None);
        timer.start(now, ms(100));
        assert_eq!(timer.elapsed(now + ms(40)), Some(ms(40)));
    }

    #[test]
    fn it_backs_off_up_to_the_maximum() {
        let now = Instant::now();
        let mut timer = AckTimer::new(ms(800), ms(400), ms(2400));

        for _ in 0..5 {
            timer.restart(now);
            assert!(timer.poll_expired(now + timer.period()));
            assert!(timer.period() <= ms(2400));
        }
        assert_eq!(timer.period(), ms(2400));
    }

    #[test]
    fn it_speeds_up_down_to_the_minimum() {
        let mut timer = AckTimer::new(ms(800), ms(400), ms(2400));

        timer.adapt(ms(0));
        assert_eq!(timer.period(), ms(700));

        for _ in 0..50 {
            timer.adapt(ms(10));
        }
        assert_eq!(timer.period(), ms(400));
    }

    #[test]
    fn it_stays_within_bounds_under_mixed_events() {
        let now = Instant::now();
        let mut timer = AckTimer::new(ms(800), ms(400), ms(2400));

        for round in 0..40u64 {
            if round % 3 == 0 {
                timer.restart(now);
                timer.poll_expired(now + ms(10_000));
            } else {
                timer.adapt(ms(round * 97 % 5000));
            }
            assert!(timer.period() >= ms(400) && timer.period() <= ms(2400));
        }
    }

    #[test]
    fn it_resets_to_the_initial_period() {
        let mut timer = AckTimer::new(ms(800), ms(400), ms(2400));
        timer.adapt(ms(2400));
        timer.reset();

        assert_eq!(timer.period(), ms(800));
        assert!(!timer.is_running());
    }
}
