//! Bounded polling with an injectable delay

use embedded_hal::delay::DelayNs;

/// The condition did not become true within the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitTimeout {
    /// Microseconds spent sleeping before giving up
    pub waited_us: u32,
}

/// Poll `done` until it returns true or `timeout_us` microseconds of sleep
/// have elapsed
///
/// The condition is checked before every sleep, so an already-satisfied
/// condition costs no delay at all. Sleeps are `step_us` long, shortened on
/// the last step so the total sleep on timeout is exactly `timeout_us`.
///
/// Returns the microseconds slept before the condition held.
pub fn bounded_wait<D, F>(
    delay: &mut D,
    timeout_us: u32,
    step_us: u32,
    mut done: F,
) -> Result<u32, WaitTimeout>
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let step_us = step_us.max(1);
    let mut elapsed = 0u32;

    loop {
        if done() {
            return Ok(elapsed);
        }
        if elapsed >= timeout_us {
            return Err(WaitTimeout { waited_us: elapsed });
        }
        let nap = step_us.min(timeout_us - elapsed);
        delay.delay_us(nap);
        elapsed += nap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Delay that only counts
    struct CountingDelay {
        elapsed_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.elapsed_ns += ns as u64;
        }

        fn delay_us(&mut self, us: u32) {
            self.elapsed_ns += us as u64 * 1_000;
        }
    }

    #[test]
    fn test_immediate_success_costs_nothing() {
        let mut delay = CountingDelay { elapsed_ns: 0 };
        assert_eq!(bounded_wait(&mut delay, 100, 1, || true), Ok(0));
        assert_eq!(delay.elapsed_ns, 0);
    }

    #[test]
    fn test_timeout_is_exact() {
        let mut delay = CountingDelay { elapsed_ns: 0 };
        let result = bounded_wait(&mut delay, 1_000, 7, || false);
        assert_eq!(result, Err(WaitTimeout { waited_us: 1_000 }));
        assert_eq!(delay.elapsed_ns, 1_000_000);
    }

    #[test]
    fn test_succeeds_after_polls() {
        let mut delay = CountingDelay { elapsed_ns: 0 };
        let polls = Cell::new(0);
        let result = bounded_wait(&mut delay, 1_000, 10, || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });
        assert_eq!(result, Ok(30));
    }

    #[test]
    fn test_zero_step_still_progresses() {
        let mut delay = CountingDelay { elapsed_ns: 0 };
        assert!(bounded_wait(&mut delay, 5, 0, || false).is_err());
        assert_eq!(delay.elapsed_ns, 5_000);
    }
}
