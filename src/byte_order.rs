//! Explicit network byte-order conversions for wire integers.
//!
//! Every multi-byte field on the wire is big-endian. These helpers swap
//! bytes on little-endian hosts and are the identity on big-endian hosts.
//! `to_host_*` performs the same swap as `to_network_*` (the operation is
//! self-inverse); the two names exist so call sites state their direction.

/// Convert a host-order `u16` to network byte order.
///
/// # Examples
///
/// ```
/// use streammux::byte_order::{to_host_u16, to_network_u16};
///
/// let wire = to_network_u16(0x1234);
/// assert_eq!(to_host_u16(wire), 0x1234);
/// ```
#[must_use]
pub fn to_network_u16(value: u16) -> u16 { value.to_be() }

/// Convert a network-order `u16` to host byte order.
#[must_use]
pub fn to_host_u16(value: u16) -> u16 { u16::from_be(value) }

/// Convert a host-order `i16` to network byte order.
#[must_use]
pub fn to_network_i16(value: i16) -> i16 { value.to_be() }

/// Convert a network-order `i16` to host byte order.
#[must_use]
pub fn to_host_i16(value: i16) -> i16 { i16::from_be(value) }

/// Convert a host-order `u32` to network byte order.
///
/// # Examples
///
/// ```
/// use streammux::byte_order::to_network_u32;
///
/// let wire = to_network_u32(0x1234_5678);
/// assert_eq!(wire.to_ne_bytes(), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn to_network_u32(value: u32) -> u32 { value.to_be() }

/// Convert a network-order `u32` to host byte order.
#[must_use]
pub fn to_host_u32(value: u32) -> u32 { u32::from_be(value) }

/// Convert a host-order `i32` to network byte order.
#[must_use]
pub fn to_network_i32(value: i32) -> i32 { value.to_be() }

/// Convert a network-order `i32` to host byte order.
#[must_use]
pub fn to_host_i32(value: i32) -> i32 { i32::from_be(value) }

/// Convert a host-order `u64` to network byte order.
#[must_use]
pub fn to_network_u64(value: u64) -> u64 { value.to_be() }

/// Convert a network-order `u64` to host byte order.
#[must_use]
pub fn to_host_u64(value: u64) -> u64 { u64::from_be(value) }

/// Convert a host-order `i64` to network byte order.
#[must_use]
pub fn to_network_i64(value: i64) -> i64 { value.to_be() }

/// Convert a network-order `i64` to host byte order.
#[must_use]
pub fn to_host_i64(value: i64) -> i64 { i64::from_be(value) }

#[cfg(test)]
mod tests {
    //! Round-trip and wire-layout tests for the conversion helpers.

    use proptest::prelude::*;
    use rstest::rstest;

    use super::{
        to_host_i16,
        to_host_i32,
        to_host_i64,
        to_host_u16,
        to_host_u32,
        to_host_u64,
        to_network_i16,
        to_network_i32,
        to_network_i64,
        to_network_u16,
        to_network_u32,
        to_network_u64,
    };

    /// Each unsigned width round-trips through network order.
    #[rstest]
    #[case::u16(u64::from(to_host_u16(to_network_u16(0x1234))), 0x1234)]
    #[case::u32(u64::from(to_host_u32(to_network_u32(0x1234_5678))), 0x1234_5678)]
    #[case::u64(
        to_host_u64(to_network_u64(0x1234_5678_90AB_CDEF)),
        0x1234_5678_90AB_CDEF
    )]
    fn unsigned_round_trip(#[case] round_tripped: u64, #[case] value: u64) {
        assert_eq!(round_tripped, value);
    }

    #[rstest]
    #[case::i16(i64::from(to_host_i16(to_network_i16(-10))), -10)]
    #[case::i32(i64::from(to_host_i32(to_network_i32(-10))), -10)]
    #[case::i64(to_host_i64(to_network_i64(-10)), -10)]
    fn signed_round_trip(#[case] round_tripped: i64, #[case] value: i64) {
        assert_eq!(round_tripped, value);
    }

    /// The native byte representation of a network-order value is big-endian.
    #[test]
    fn network_order_is_big_endian_in_memory() {
        assert_eq!(to_network_u16(0x1234).to_ne_bytes(), [0x12, 0x34]);
        assert_eq!(
            to_network_u32(0x1234_5678).to_ne_bytes(),
            [0x12, 0x34, 0x56, 0x78]
        );
        assert_eq!(
            to_network_u64(0x1122_3344_5566_7788).to_ne_bytes(),
            [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_all_values(a: u16, b: u32, c: u64, d: i16, e: i32, f: i64) {
            prop_assert_eq!(to_host_u16(to_network_u16(a)), a);
            prop_assert_eq!(to_host_u32(to_network_u32(b)), b);
            prop_assert_eq!(to_host_u64(to_network_u64(c)), c);
            prop_assert_eq!(to_host_i16(to_network_i16(d)), d);
            prop_assert_eq!(to_host_i32(to_network_i32(e)), e);
            prop_assert_eq!(to_host_i64(to_network_i64(f)), f);
        }
    }
}
