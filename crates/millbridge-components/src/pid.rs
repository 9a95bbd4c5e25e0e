//! Temperature PID controller component, reached over the single-initiator
//! serial fieldbus (§4.4).
//!
//! Grounded in the original firmware's `PidModbusComponent` for the
//! OK→DEGRADED→MISSING transition policy (`components/pid_modbus.cpp`),
//! reworked from a single synchronous `read_live` call into the
//! completion-slot model: [`PidComponent::deliver_completion`] only stores
//! the result, and the next [`millbridge_health::HealthComponent::tick`]
//! call decodes it and performs the health transition, matching §5's rule
//! that only `tick` may mutate component state.
//!
//! Register offsets within each block follow `millbridge_hal::register_map`;
//! every analog register in both blocks is read as the same signed ×10
//! fixed-point value (see `DESIGN.md` for why PID gains share the
//! temperature/percent encoding in this implementation).

use millbridge_errors::ComponentFault;
use millbridge_hal::{register_map, Fieldbus, FieldbusCompletion, FieldbusRequestKind};
use millbridge_health::HealthComponent;
use millbridge_fieldbus::PidSlave;
use millbridge_schemas::{decode_fixed10, encode_fixed10, HealthReport, HealthStatus, PidParams, PidState, Severity};

pub struct PidComponent {
    name: String,
    slave_id: u8,
    report: HealthReport,
    state: PidState,
    params: PidParams,
    pending: Option<(FieldbusRequestKind, Option<FieldbusCompletion>)>,
}

impl PidComponent {
    #[must_use]
    pub fn new(name: impl Into<String>, slave_id: u8) -> Self {
        Self {
            name: name.into(),
            slave_id,
            report: HealthReport::initial(false, false, 0),
            state: PidState::default(),
            params: PidParams::default(),
            pending: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> PidState {
        self.state.clone()
    }

    #[must_use]
    pub fn params(&self) -> PidParams {
        self.params.clone()
    }

    /// Priority synchronous setpoint write (§4.4). Not retried
    /// automatically on failure; the operator or controller must reissue.
    pub fn set_sv(&mut self, value: f32, fieldbus: &mut dyn Fieldbus, now_ms: u64) -> Result<(), ComponentFault> {
        let raw = encode_fixed10(value);
        if fieldbus.submit_write_single(self.slave_id, register_map::REG_SV, raw) {
            self.state.sv = value;
            self.mark_ok(now_ms);
            Ok(())
        } else {
            self.mark_fault(ComponentFault::SvWriteFail, now_ms);
            Err(ComponentFault::SvWriteFail)
        }
    }

    fn mark_ok(&mut self, now_ms: u64) {
        if self.report.status != HealthStatus::Ok {
            self.report.since_ms = now_ms;
        }
        self.report.status = HealthStatus::Ok;
        self.report.severity = Severity::Info;
        self.report.reason = "ok".to_string();
        self.report.last_ok_ms = now_ms;
    }

    fn mark_fault(&mut self, fault: ComponentFault, now_ms: u64) {
        self.report.status = HealthStatus::Degraded;
        self.report.severity = if self.report.required { Severity::Crit } else { Severity::Warn };
        self.report.reason = fault.token().to_string();
        self.report.since_ms = now_ms;
    }

    fn apply_read_failure(&mut self, now_ms: u64) {
        // §4.4: an OK component degrades on the first failed refresh; a
        // non-OK component (already degraded) drops to MISSING instead.
        let was_ok = self.report.status == HealthStatus::Ok;
        if was_ok {
            self.report.status = HealthStatus::Degraded;
            self.report.reason = ComponentFault::ModbusReadFail.token().to_string();
        } else {
            self.report.status = HealthStatus::Missing;
            self.report.reason = ComponentFault::ModbusNoResponse.token().to_string();
        }
        self.report.severity = if self.report.required { Severity::Crit } else { Severity::Warn };
        self.report.since_ms = now_ms;
        self.state.valid = false;
    }

    fn decode_state(registers: &[i16]) -> PidState {
        PidState {
            pv: decode_fixed10(registers[register_map::state_offset(register_map::REG_PV)]),
            sv: decode_fixed10(registers[register_map::state_offset(register_map::REG_SV)]),
            out_pct: decode_fixed10(registers[register_map::state_offset(register_map::REG_MV1)]),
            status: registers[register_map::state_offset(register_map::REG_STATUS)] as u16,
            alarm1: registers[register_map::state_offset(register_map::REG_AL1)] as u16,
            alarm2: registers[register_map::state_offset(register_map::REG_AL2)] as u16,
            alarm_active: registers[register_map::state_offset(register_map::REG_AL1)] != 0
                || registers[register_map::state_offset(register_map::REG_AL2)] != 0,
            valid: true,
        }
    }

    fn decode_params(registers: &[i16]) -> PidParams {
        PidParams {
            p: decode_fixed10(registers[register_map::params_offset(register_map::REG_P)]),
            i: decode_fixed10(registers[register_map::params_offset(register_map::REG_I)]),
            d: decode_fixed10(registers[register_map::params_offset(register_map::REG_D)]),
            output_min: decode_fixed10(registers[register_map::params_offset(register_map::REG_OPL)]),
            output_max: decode_fixed10(registers[register_map::params_offset(register_map::REG_OPH)]),
            sv_min: decode_fixed10(registers[register_map::params_offset(register_map::REG_LSPL)]),
            sv_max: decode_fixed10(registers[register_map::params_offset(register_map::REG_USPL)]),
            valid: true,
        }
    }
}

impl HealthComponent for PidComponent {
    fn configure(&mut self, expected: bool, required: bool, now_ms: u64) {
        self.report = HealthReport::initial(expected, required, now_ms);
    }

    fn probe(&mut self, _now_ms: u64) -> bool {
        // Synchronous detection is incompatible with the async-completion
        // fieldbus model (§5): the first successful scheduler read, not
        // `probe`, is what flips this component to OK.
        false
    }

    fn tick(&mut self, now_ms: u64) -> bool {
        if !self.report.expected {
            return false;
        }
        let Some((kind, completion)) = self.pending.take() else {
            return false;
        };
        match completion {
            Some(c) => match (kind, c.registers) {
                (FieldbusRequestKind::ReadState, Some(registers))
                    if registers.len() == register_map::STATE_BLOCK_COUNT as usize =>
                {
                    self.state = Self::decode_state(&registers);
                    self.mark_ok(now_ms);
                    true
                }
                (FieldbusRequestKind::ReadParams, Some(registers))
                    if registers.len() == register_map::PARAMS_BLOCK_COUNT as usize =>
                {
                    self.params = Self::decode_params(&registers);
                    self.mark_ok(now_ms);
                    true
                }
                _ => {
                    self.apply_read_failure(now_ms);
                    false
                }
            },
            None => {
                self.apply_read_failure(now_ms);
                false
            }
        }
    }

    fn stale_timeout_ms(&self) -> u32 {
        1_500
    }

    fn report(&self) -> HealthReport {
        self.report.clone()
    }
}

impl PidSlave for PidComponent {
    fn slave_id(&self) -> u8 {
        self.slave_id
    }

    fn deliver_completion(&mut self, kind: FieldbusRequestKind, completion: Option<FieldbusCompletion>) {
        self.pending = Some((kind, completion));
    }
}
