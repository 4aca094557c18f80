use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Consumer of the machine's `PRN` and `PRA` output.
///
/// Calls must be rendered in the order they are made.
pub trait Printer {
    /// `PRN`: decimal value followed by a newline.
    fn print_number(&mut self, value: u8);
    /// `PRA`: character with the given code point.
    fn print_char(&mut self, value: u8);
}

/// Collects printed output in memory.
impl Printer for String {
    fn print_number(&mut self, value: u8) {
        self.push_str(&value.to_string());
        self.push('\n');
    }

    fn print_char(&mut self, value: u8) {
        self.push(value as char);
    }
}

/// An interrupt request from a device outside the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// Periodic timer, interrupt 0.
    Timer,
    /// Key press carrying its key code, interrupt 1.
    Keyboard(u8),
}

impl Interrupt {
    /// Bit of the interrupt status register set by this request.
    pub fn number(&self) -> u8 {
        match self {
            Self::Timer => 0,
            Self::Keyboard(_) => 1,
        }
    }
}

/// Something the machine polls once per cycle, before fetching an instruction.
///
/// A source should keep a request pending until it is returned from `poll`.
pub trait InterruptSource {
    fn poll(&mut self) -> Option<Interrupt>;
}

/// Never raises anything.
#[derive(Debug, Default)]
pub struct NoInterrupts;

impl InterruptSource for NoInterrupts {
    fn poll(&mut self) -> Option<Interrupt> {
        None
    }
}

/// Sources are polled in order; the first pending request wins the cycle.
impl InterruptSource for Vec<Box<dyn InterruptSource>> {
    fn poll(&mut self) -> Option<Interrupt> {
        self.iter_mut().find_map(|source| source.poll())
    }
}

/// Raises [`Interrupt::Timer`] each time `period` has elapsed.
#[derive(Debug)]
pub struct Timer {
    period: Duration,
    deadline: Instant,
}

impl Timer {
    pub fn new(period: Duration) -> Self {
        Timer {
            period,
            deadline: Instant::now() + period,
        }
    }

    /// One tick per second.
    pub fn seconds() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl InterruptSource for Timer {
    fn poll(&mut self) -> Option<Interrupt> {
        let now = Instant::now();
        if now < self.deadline {
            return None;
        }
        self.deadline = now + self.period;
        Some(Interrupt::Timer)
    }
}

/// Replays a fixed list of requests, one per cycle.
///
/// `None` entries are idle cycles, which makes it possible to raise a request at an exact cycle.
#[derive(Debug, Default)]
pub struct Scripted {
    queue: VecDeque<Option<Interrupt>>,
}

impl Scripted {
    pub fn new(script: impl IntoIterator<Item = Option<Interrupt>>) -> Self {
        Scripted {
            queue: script.into_iter().collect(),
        }
    }

    /// Type each byte of `keys` on consecutive cycles.
    pub fn keys(keys: &[u8]) -> Self {
        Self::new(keys.iter().map(|&key| Some(Interrupt::Keyboard(key))))
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl InterruptSource for Scripted {
    fn poll(&mut self) -> Option<Interrupt> {
        self.queue.pop_front().flatten()
    }
}
