//! Vectorized kernels for the bit-packed encoding. Over $\mathbb{F}_2$ every nonzero scalar is 1,
//! so a row operation is a plain XOR of limbs.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        mod x86_64;
        use x86_64 as arch;
    } else {
        use generic as arch;
    }
}

mod generic;

use crate::limb::Limb;

/// Set `target[i] ^= source[i]` for every `i >= min_limb`.
pub(crate) fn xor_limbs(target: &mut [Limb], source: &[Limb], min_limb: usize) {
    assert_eq!(target.len(), source.len());
    if min_limb >= target.len() {
        return;
    }
    arch::xor_limbs(target, source, min_limb)
}
