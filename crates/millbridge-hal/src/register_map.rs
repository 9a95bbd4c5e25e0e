//! Fieldbus register map (§6). Addresses are 1-based as specified by the
//! controller's documentation; [`crate::Fieldbus`] implementations are
//! responsible for translating to whatever 0-based addressing their wire
//! protocol actually uses.

/// Process value.
pub const REG_PV: u16 = 1;
/// Controller output, percent.
pub const REG_MV1: u16 = 2;
pub const REG_MV2: u16 = 3;
pub const REG_MVFB: u16 = 4;
/// Status bitfield.
pub const REG_STATUS: u16 = 5;
/// Setpoint.
pub const REG_SV: u16 = 6;
pub const REG_AL1: u16 = 15;
pub const REG_AL2: u16 = 16;
pub const REG_P: u16 = 25;
pub const REG_I: u16 = 26;
pub const REG_D: u16 = 27;
pub const REG_OPL: u16 = 33;
pub const REG_OPH: u16 = 34;
pub const REG_LSPL: u16 = 69;
pub const REG_USPL: u16 = 70;

/// The state read block spans PV..AL2 inclusive in one contiguous
/// transaction.
pub const STATE_BLOCK_START: u16 = REG_PV;
pub const STATE_BLOCK_COUNT: u16 = REG_AL2 - REG_PV + 1;

/// The params read block spans P..USPL inclusive in one contiguous
/// transaction.
pub const PARAMS_BLOCK_START: u16 = REG_P;
pub const PARAMS_BLOCK_COUNT: u16 = REG_USPL - REG_P + 1;

/// Offset of a register within the state block, for decoding the
/// contiguous read response.
#[must_use]
pub fn state_offset(reg: u16) -> usize {
    (reg - STATE_BLOCK_START) as usize
}

/// Offset of a register within the params block, for decoding the
/// contiguous read response.
#[must_use]
pub fn params_offset(reg: u16) -> usize {
    (reg - PARAMS_BLOCK_START) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_block_covers_pv_through_al2() {
        assert_eq!(STATE_BLOCK_COUNT, 16);
        assert_eq!(state_offset(REG_PV), 0);
        assert_eq!(state_offset(REG_AL2), 15);
    }

    #[test]
    fn params_block_covers_p_through_uspl() {
        assert_eq!(PARAMS_BLOCK_COUNT, 46);
        assert_eq!(params_offset(REG_P), 0);
        assert_eq!(params_offset(REG_USPL), 45);
    }
}
