use crate::limb::Limb;

/// Defines a module `$name` containing a `xor_limbs` kernel compiled for the target feature `$arch`,
/// using `$ty` as the register type and the given load/store/xor intrinsics.
macro_rules! xor_limbs_arch {
    ($name:ident, $arch:literal, $ty:ident, $load:ident, $store:ident, $xor:ident) => {
        mod $name {
            use std::arch::x86_64;

            use crate::limb::Limb;

            type SimdLimb = x86_64::$ty;

            const LIMBS_PER_SIMD: usize =
                std::mem::size_of::<SimdLimb>() / crate::constants::BYTES_PER_LIMB;

            #[target_feature(enable = $arch)]
            pub(super) unsafe fn xor_limbs(target: &mut [Limb], source: &[Limb], min_limb: usize) {
                let max_limb = target.len();
                let chunks = (max_limb - min_limb) / LIMBS_PER_SIMD;
                let target = target.as_mut_ptr();
                let source = source.as_ptr();
                for i in 0..chunks {
                    // In bounds: offset + LIMBS_PER_SIMD <= max_limb, and both slices have
                    // length max_limb.
                    unsafe {
                        let offset = LIMBS_PER_SIMD * i + min_limb;
                        let t = x86_64::$load(target.add(offset) as *const SimdLimb);
                        let s = x86_64::$load(source.add(offset) as *const SimdLimb);
                        x86_64::$store(target.add(offset) as *mut SimdLimb, x86_64::$xor(t, s));
                    }
                }
                for i in (min_limb + LIMBS_PER_SIMD * chunks)..max_limb {
                    unsafe {
                        *target.add(i) ^= *source.add(i);
                    }
                }
            }
        }
    };
}

xor_limbs_arch!(avx2, "avx2", __m256i, _mm256_loadu_si256, _mm256_storeu_si256, _mm256_xor_si256);
xor_limbs_arch!(sse2, "sse2", __m128i, _mm_loadu_si128, _mm_storeu_si128, _mm_xor_si128);

pub(super) fn xor_limbs(target: &mut [Limb], source: &[Limb], min_limb: usize) {
    if is_x86_feature_detected!("avx2") {
        unsafe { avx2::xor_limbs(target, source, min_limb) }
    } else if is_x86_feature_detected!("sse2") {
        unsafe { sse2::xor_limbs(target, source, min_limb) }
    } else {
        super::generic::xor_limbs(target, source, min_limb)
    }
}
