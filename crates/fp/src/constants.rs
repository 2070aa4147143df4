use build_const::build_const;

build_const!("constants");

#[macro_export]
macro_rules! const_for {
    ($i:ident in $a:literal.. $b:ident $contents:block) => {
        let mut $i = $a;
        while $i < $b {
            $contents;
            $i += 1;
        }
    };
}

/// `INVERSE_TABLE[PRIME_TO_INDEX_MAP[p]][k]` is the multiplicative inverse of `k` modulo `p`, for
/// `0 < k < p`. The entry at `k = 0` is unused and left as zero.
pub(crate) static INVERSE_TABLE: [[u8; MAX_PRIME]; NUM_PRIMES] = {
    let mut result = [[0; MAX_PRIME]; NUM_PRIMES];
    const_for! { i in 0 .. NUM_PRIMES {
        let p = PRIMES[i];
        const_for! { k in 1 .. p {
            result[i][k as usize] = crate::prime::power_mod(p, k, p - 2) as u8;
        }}
    }};
    result
};
