//! Bit helpers for 32-bit capability bitmaps. Bits past 31 do not exist.

/// Set bit `bit` of `x` on if `toggle` is true, otherwise off.
pub fn bit(bit: u16, x: u32, toggle: bool) -> u32 {
    match 1u32.checked_shl(u32::from(bit)) {
        Some(m) if toggle => x | m,
        Some(m) => x & !m,
        None => x,
    }
}

/// Test whether bit `bit` of `x` is set.
pub fn test_bit(bit: u16, x: u32) -> bool {
    1u32.checked_shl(u32::from(bit)).map_or(false, |m| x & m != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_test() {
        let x = bit(25, 0, true);
        assert_eq!(x, 0x0200_0000);
        assert!(test_bit(25, x));
        assert_eq!(bit(25, x, false), 0);
        assert_eq!(bit(0xffff, 7, true), 7);
        assert!(!test_bit(0xffff, u32::max_value()));
    }
}
