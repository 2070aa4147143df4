//! Bookkeeping for the bit-packed encoding, where every entry of $\mathbb{F}_2$ occupies a single
//! bit of a `Limb`.

pub(crate) use crate::constants::Limb;

use crate::constants::BITS_PER_LIMB;

/// A struct containing the information required to access a specific entry in an array of `Limb`s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct LimbBitIndexPair {
    pub(crate) limb: usize,
    pub(crate) bit_index: usize,
}

pub(crate) const fn limb_bit_index_pair(idx: usize) -> LimbBitIndexPair {
    LimbBitIndexPair {
        limb: idx / BITS_PER_LIMB,
        bit_index: idx % BITS_PER_LIMB,
    }
}

/// Return the number of limbs required to hold `dim` entries.
pub(crate) const fn number(dim: usize) -> usize {
    if dim == 0 {
        0
    } else {
        limb_bit_index_pair(dim - 1).limb + 1
    }
}

/// Round `n` up to the nearest multiple of `align`, which must be a power of two. Saturates to
/// `usize::MAX` if the result does not fit.
pub(crate) const fn round_up(n: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    match n.checked_add(align - 1) {
        Some(n) => n & !(align - 1),
        None => usize::MAX,
    }
}

/// The index of the first set bit in `limbs`, if any.
pub(crate) fn first_set_bit(limbs: &[Limb]) -> Option<usize> {
    limbs
        .iter()
        .position(|&limb| limb != 0)
        .map(|i| i * BITS_PER_LIMB + limbs[i].trailing_zeros() as usize)
}

/// Give an iterator over the bits of `limb`, least significant first.
pub(crate) fn unpack(mut limb: Limb) -> impl Iterator<Item = u32> {
    (0..BITS_PER_LIMB).map(move |_| {
        let result = (limb & 1) as u32;
        limb >>= 1;
        result
    })
}
