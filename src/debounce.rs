/// Timing policies for snapshot saves: trailing-edge debounce and a periodic interval

/// Coalesces a burst of triggers into one action.
///
/// Each `schedule` pushes the deadline out and hands back a ticket; only
/// the newest ticket can fire, and only once its deadline has passed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: f64,
    generation: u64,
    deadline: Option<f64>,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Debouncer {
        Debouncer {
            delay_ms: delay_ms as f64,
            generation: 0,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now_ms: f64) -> u64 {
        self.generation += 1;
        self.deadline = Some(now_ms + self.delay_ms);
        self.generation
    }

    /// Time left before `ticket` may fire; `None` once it has been superseded
    pub fn remaining(&self, ticket: u64, now_ms: f64) -> Option<f64> {
        if ticket != self.generation {
            return None;
        }
        self.deadline.map(|deadline| (deadline - now_ms).max(0.0))
    }

    /// Consume the pending trigger if `ticket` is current and due
    pub fn fire(&mut self, ticket: u64, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if ticket == self.generation && now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// On/off state of a repeating timer.
///
/// Restarting bumps the generation so a loop started earlier notices it
/// has been replaced and exits.
#[derive(Debug, Clone, Default)]
pub struct Interval {
    generation: u64,
    running: bool,
}

impl Interval {
    pub fn start(&mut self) -> u64 {
        self.generation += 1;
        self.running = true;
        self.generation
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Generation of the running timer, if any
    pub fn current(&self) -> Option<u64> {
        self.running.then_some(self.generation)
    }

    pub fn is_running(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_trigger_fires_after_delay() {
        let mut debouncer = Debouncer::new(1000);
        let ticket = debouncer.schedule(0.0);

        assert_eq!(debouncer.remaining(ticket, 400.0), Some(600.0));
        assert!(!debouncer.fire(ticket, 999.0));
        assert!(debouncer.fire(ticket, 1000.0));
        // Fires only once
        assert!(!debouncer.fire(ticket, 2000.0));
    }

    #[test]
    fn test_burst_coalesces_to_last_trigger() {
        let mut debouncer = Debouncer::new(1000);
        let first = debouncer.schedule(0.0);
        let second = debouncer.schedule(300.0);
        let last = debouncer.schedule(900.0);

        assert_eq!(debouncer.remaining(first, 1000.0), None);
        assert!(!debouncer.fire(first, 1000.0));
        assert!(!debouncer.fire(second, 1300.0));
        assert!(!debouncer.fire(last, 1300.0));
        assert!(debouncer.fire(last, 1900.0));
    }

    #[test]
    fn test_interval_restart_and_stop() {
        let mut interval = Interval::default();
        assert_eq!(interval.current(), None);

        let first = interval.start();
        let second = interval.start();
        assert!(!interval.is_running(first));
        assert!(interval.is_running(second));

        interval.stop();
        assert!(!interval.is_running(second));
        assert_eq!(interval.current(), None);
    }
}
