//! Relógio monotônico usado pelo sensor e pelo loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Fonte de tempo monotônico com sleep bloqueante.
pub trait Clock {
    /// Tempo decorrido desde uma origem arbitrária.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// Relógio real: `Instant` + `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Relógio virtual para testes.
///
/// Cada chamada a [`Clock::now`] avança `tick`, simulando o custo de uma
/// iteração de polling; `sleep` avança exatamente a duração pedida. Clones
/// compartilham o mesmo tempo.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
    tick: Duration,
}

impl ManualClock {
    pub fn new(tick: Duration) -> Self {
        Self {
            now: Rc::new(Cell::new(Duration::ZERO)),
            tick,
        }
    }

    /// Tempo atual sem avançar o tick.
    pub fn peek(&self) -> Duration {
        self.now.get()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let t = self.now.get();
        self.now.set(t + self.tick);
        t
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_ticks_on_observation() {
        let clock = ManualClock::new(Duration::from_micros(2));
        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_micros(2));
        clock.sleep(Duration::from_millis(1));
        assert_eq!(clock.peek(), Duration::from_micros(1004));
    }

    #[test]
    fn clones_share_time() {
        let a = ManualClock::new(Duration::ZERO);
        let b = a.clone();
        a.advance(Duration::from_secs(3));
        assert_eq!(b.peek(), Duration::from_secs(3));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let t0 = clock.now();
        clock.sleep(Duration::from_millis(1));
        assert!(clock.now() > t0);
    }
}
