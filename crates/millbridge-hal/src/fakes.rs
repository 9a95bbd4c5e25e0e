//! In-memory fakes for the HAL traits, used by every crate's test suite.
//!
//! Mirrors the teacher corpus's preference for hand-written fakes over a
//! mocking framework (the `hid-*-protocol` crates are tested without real
//! hardware the same way).

use std::collections::VecDeque;

use millbridge_schemas::DinSnapshot;

use crate::{AccelSensor, DigitalInputs, Fieldbus, FieldbusCompletion, NetworkLink, RelayBank};

/// A scriptable digital-input fake: push masks and read them back one at a
/// time, computing rising/falling edges against the previous mask.
#[derive(Debug, Default)]
pub struct FakeDin {
    prev_mask: Option<u8>,
    queued: VecDeque<u8>,
    began: bool,
}

impl FakeDin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next mask to be returned by `read_all`.
    pub fn push(&mut self, mask: u8) {
        self.queued.push_back(mask);
    }
}

impl DigitalInputs for FakeDin {
    fn begin(&mut self) -> bool {
        self.began = true;
        true
    }

    fn read_all(&mut self) -> DinSnapshot {
        let mask = self.queued.pop_front().unwrap_or_else(|| self.prev_mask.unwrap_or(0));
        let (rising, falling) = match self.prev_mask {
            None => (0, 0),
            Some(prev) => (mask & !prev, prev & !mask),
        };
        self.prev_mask = Some(mask);
        DinSnapshot { mask, rising, falling }
    }
}

/// A relay bank fake backed by a plain `u8` mask, with a knob to simulate
/// write failures.
#[derive(Debug, Default)]
pub struct FakeRelay {
    mask: u8,
    pub fail_writes: bool,
    pub fail_reads: bool,
}

impl FakeRelay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelayBank for FakeRelay {
    fn begin(&mut self) -> bool {
        true
    }

    fn write_mask(&mut self, mask: u8) -> bool {
        if self.fail_writes {
            return false;
        }
        self.mask = mask;
        true
    }

    fn read_mask(&mut self) -> Option<u8> {
        if self.fail_reads {
            None
        } else {
            Some(self.mask)
        }
    }
}

/// A network link fake with a mutable connected flag.
#[derive(Debug, Default)]
pub struct FakeNetwork {
    pub connected: bool,
    pub local_ip: Option<[u8; 4]>,
}

impl NetworkLink for FakeNetwork {
    fn connected(&self) -> bool {
        self.connected
    }

    fn local_ip(&self) -> Option<[u8; 4]> {
        self.local_ip
    }
}

/// An accelerometer fake with a scriptable reading.
#[derive(Debug, Default)]
pub struct FakeAccel {
    pub reading: Option<f32>,
}

impl AccelSensor for FakeAccel {
    fn begin(&mut self) -> bool {
        true
    }

    fn read_g(&mut self) -> Option<f32> {
        self.reading
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    tx_id: u32,
    succeed: bool,
    registers: u16,
}

/// A fieldbus fake enforcing the single-in-flight invariant (F1) and able
/// to script per-transaction success/failure for tests.
#[derive(Debug, Default)]
pub struct FakeFieldbus {
    next_tx_id: u32,
    in_flight: Option<InFlight>,
    /// Scripted outcomes consumed in order as transactions are submitted.
    script: VecDeque<bool>,
    pub writes: Vec<(u8, u16, i16)>,
    pending_completion: Option<FieldbusCompletion>,
}

impl FakeFieldbus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue whether the next submitted transaction should succeed.
    pub fn script_outcome(&mut self, succeed: bool) {
        self.script.push_back(succeed);
    }

    /// Complete the in-flight transaction immediately (as if `task()` had
    /// driven the transport to completion).
    pub fn complete_now(&mut self) {
        if let Some(pending) = self.in_flight.take() {
            self.pending_completion = Some(FieldbusCompletion {
                tx_id: pending.tx_id,
                registers: if pending.succeed {
                    Some(vec![0i16; pending.registers as usize])
                } else {
                    None
                },
            });
        }
    }
}

impl Fieldbus for FakeFieldbus {
    fn begin(&mut self) -> bool {
        true
    }

    fn submit_read_holding(&mut self, _slave: u8, _addr: u16, count: u16) -> Option<u32> {
        if self.in_flight.is_some() {
            return None;
        }
        self.next_tx_id += 1;
        let succeed = self.script.pop_front().unwrap_or(true);
        self.in_flight = Some(InFlight { tx_id: self.next_tx_id, succeed, registers: count });
        Some(self.next_tx_id)
    }

    fn submit_write_single(&mut self, slave: u8, addr: u16, value: i16) -> bool {
        let succeed = self.script.pop_front().unwrap_or(true);
        if succeed {
            self.writes.push((slave, addr, value));
        }
        succeed
    }

    fn task(&mut self) {
        // The fake completes transactions synchronously via `complete_now`
        // so tests control timing explicitly; `task` is a no-op here.
    }

    fn take_completion(&mut self) -> Option<FieldbusCompletion> {
        self.pending_completion.take()
    }
}
