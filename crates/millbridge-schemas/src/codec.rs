//! Signed ×10 fixed-point codec used by the fieldbus register map.
//!
//! Temperatures and percentages travel over the wire as signed 16-bit
//! integers scaled by ten (`raw = round(value * 10)`), per the register
//! map in §6 of the specification.

/// Decode a raw register value into its floating-point representation.
#[must_use]
pub fn decode_fixed10(raw: i16) -> f32 {
    f32::from(raw) / 10.0
}

/// Encode a floating-point value into its raw ×10 register representation.
///
/// Rounds to the nearest integer and saturates to the `i16` range rather
/// than overflowing, since a register write must never panic.
#[must_use]
pub fn encode_fixed10(value: f32) -> i16 {
    let scaled = (value * 10.0).round();
    if scaled >= f32::from(i16::MAX) {
        i16::MAX
    } else if scaled <= f32::from(i16::MIN) {
        i16::MIN
    } else {
        // SAFETY-free: range checked above, cast is exact for the remaining domain.
        scaled as i16
    }
}
