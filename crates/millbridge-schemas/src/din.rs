//! Digital-input snapshot and interlock bit assignments (§3).

use serde::{Deserialize, Serialize};

/// Bit 0: estop-ok (active-high).
pub const BIT_ESTOP_OK: u8 = 1 << 0;
/// Bit 1: lid-locked.
pub const BIT_LID_LOCKED: u8 = 1 << 1;
/// Bit 2: door-closed.
pub const BIT_DOOR_CLOSED: u8 = 1 << 2;

const INTERLOCK_MASK: u8 = BIT_ESTOP_OK | BIT_LID_LOCKED | BIT_DOOR_CLOSED;

/// A debounced read of the digital-input bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DinSnapshot {
    pub mask: u8,
    pub rising: u8,
    pub falling: u8,
}

impl DinSnapshot {
    /// Interlocks pass iff all three interlock bits are set (§3).
    #[must_use]
    pub fn interlocks_ok(&self) -> bool {
        self.mask & INTERLOCK_MASK == INTERLOCK_MASK
    }

    /// The stable reason token for the first tripped interlock, used when
    /// latching an e-stop (§7: `estop_tripped`, `door_open`, `lid_unlocked`).
    #[must_use]
    pub fn trip_reason(&self) -> &'static str {
        if self.mask & BIT_ESTOP_OK == 0 {
            "estop_tripped"
        } else if self.mask & BIT_LID_LOCKED == 0 {
            "lid_unlocked"
        } else if self.mask & BIT_DOOR_CLOSED == 0 {
            "door_open"
        } else {
            "ok"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_interlocks_set_passes() {
        let snap = DinSnapshot { mask: INTERLOCK_MASK, rising: 0, falling: 0 };
        assert!(snap.interlocks_ok());
    }

    #[test]
    fn missing_any_interlock_fails() {
        let snap = DinSnapshot { mask: BIT_LID_LOCKED | BIT_DOOR_CLOSED, rising: 0, falling: 0 };
        assert!(!snap.interlocks_ok());
        assert_eq!(snap.trip_reason(), "estop_tripped");
    }

    #[test]
    fn trip_reason_priority_order() {
        let snap = DinSnapshot { mask: BIT_ESTOP_OK | BIT_DOOR_CLOSED, rising: 0, falling: 0 };
        assert_eq!(snap.trip_reason(), "lid_unlocked");
    }
}
