//! Single-initiator fieldbus scheduler (§4.4).
//!
//! Generalizes `openracing-scheduler::AbsoluteScheduler`'s "maintain a
//! period, advance state each tick" shape from hard real-time PLL timing
//! down to the bridge's simpler two-cadence round robin: state reads are
//! cheap and frequent, parameter reads are rare and take priority when due.
//! The transport itself (`millbridge_hal::Fieldbus`) enforces the
//! single-in-flight invariant; this scheduler only decides *what* to
//! submit next and *who* gets the resulting completion.

use millbridge_hal::{Fieldbus, FieldbusCompletion, FieldbusRequestKind};
use millbridge_health::HealthComponent;

/// Contract a PID slave exposes to the scheduler (§4.4), layered on top of
/// the Health Component contract every managed device already implements.
///
/// The scheduler, not the slave, owns the `Fieldbus` handle and submits
/// transactions on the slave's behalf — every slave reads the same two
/// register blocks (`millbridge_hal::register_map`), so there is nothing
/// slave-specific about *how* a read is framed, only *whose* turn it is.
/// `tick` is inherited from [`HealthComponent`]: it applies whatever
/// completion was last delivered and produces fresh `PidState`/`PidParams`
/// (§4.1), exactly as every other component's `tick` refreshes its own
/// data.
pub trait PidSlave: HealthComponent {
    /// The Modbus slave address this PID controller answers to.
    fn slave_id(&self) -> u8;

    /// Delivers the result of this slave's outstanding transaction into
    /// its internal `pending_result` slot. Must not perform I/O or mutate
    /// health state directly — only the next `tick` does that (§5).
    fn deliver_completion(&mut self, kind: FieldbusRequestKind, completion: Option<FieldbusCompletion>);
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    tx_id: u32,
    slave_idx: usize,
    kind: FieldbusRequestKind,
}

/// Drives the round-robin state/params refresh across a PID slave table
/// (§4.4).
#[derive(Debug)]
pub struct FieldbusScheduler {
    state_period_ms: u32,
    params_period_ms: u32,
    last_state_ms: Option<u64>,
    last_params_ms: u64,
    next_state_idx: usize,
    next_params_idx: usize,
    pending: Option<Pending>,
}

impl FieldbusScheduler {
    #[must_use]
    pub fn new(state_period_ms: u32, params_period_ms: u32) -> Self {
        Self {
            state_period_ms,
            params_period_ms,
            last_state_ms: None,
            last_params_ms: 0,
            next_state_idx: 0,
            next_params_idx: 0,
            pending: None,
        }
    }

    /// `true` iff a transaction is currently outstanding.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Runs one scheduler pass (§4.4 steps 1-4). A no-op if `now_ms` has
    /// not yet reached `state_period_ms` since the last pass; the very
    /// first call always runs, since there is no "last pass" to measure
    /// from yet.
    pub fn tick(&mut self, fieldbus: &mut dyn Fieldbus, slaves: &mut [&mut dyn PidSlave], now_ms: u64) {
        if slaves.is_empty() {
            return;
        }
        let due = match self.last_state_ms {
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.state_period_ms),
            None => true,
        };
        if !due {
            return;
        }
        self.last_state_ms = Some(now_ms);

        fieldbus.task();

        if let Some(completion) = fieldbus.take_completion() {
            match self.pending.take() {
                Some(pending) if pending.tx_id == completion.tx_id => {
                    slaves[pending.slave_idx].deliver_completion(pending.kind, Some(completion));
                }
                // A completion for a transaction we no longer track (or
                // never tracked) is dropped; the targeted slave already
                // saw its own failure transition via a prior completion.
                other => self.pending = other,
            }
        }

        for slave in slaves.iter_mut() {
            slave.tick(now_ms);
        }

        if self.pending.is_some() {
            return;
        }

        let n = slaves.len();

        if now_ms.saturating_sub(self.last_params_ms) >= u64::from(self.params_period_ms) {
            let idx = self.next_params_idx % n;
            let slave_id = slaves[idx].slave_id();
            if let Some(tx_id) = fieldbus.submit_read_holding(
                slave_id,
                millbridge_hal::register_map::PARAMS_BLOCK_START,
                millbridge_hal::register_map::PARAMS_BLOCK_COUNT,
            ) {
                self.pending = Some(Pending { tx_id, slave_idx: idx, kind: FieldbusRequestKind::ReadParams });
                self.last_params_ms = now_ms;
                self.next_params_idx = (idx + 1) % n;
                return;
            }
        }

        let idx = self.next_state_idx % n;
        let slave_id = slaves[idx].slave_id();
        if let Some(tx_id) = fieldbus.submit_read_holding(
            slave_id,
            millbridge_hal::register_map::STATE_BLOCK_START,
            millbridge_hal::register_map::STATE_BLOCK_COUNT,
        ) {
            self.pending = Some(Pending { tx_id, slave_idx: idx, kind: FieldbusRequestKind::ReadState });
            self.next_state_idx = (idx + 1) % n;
        }
    }
}
