use std::io::Error;

use build_const::ConstWriter;

type Limb = u64;

/// Elements are stored one per byte, so every supported prime must be smaller than 256.
const LARGEST_SUPPORTED: u32 = u8::MAX as u32;

/// Rows of the batched encoding are processed in chunks of this many entries.
const BATCH_LANES: usize = 32;

fn main() -> Result<(), Error> {
    let primes = primes_up_to(LARGEST_SUPPORTED);
    let num_primes = primes.len();

    let max_prime = *primes.last().unwrap();
    let not_a_prime: usize = u32::MAX as usize; // Hack for 32-bit architectures

    let prime_to_index_map = (0..=max_prime)
        .map(|i| primes.iter().position(|&j| i == j).unwrap_or(not_a_prime))
        .collect::<Vec<_>>();

    let bytes_per_limb = std::mem::size_of::<Limb>();
    let bits_per_limb = 8 * bytes_per_limb;

    let mut writer = ConstWriter::for_build("constants")?.finish_dependencies();

    writer.add_raw("/// The number of primes that are supported.");
    writer.add_value("NUM_PRIMES", "usize", num_primes);
    writer.add_raw(
        "/// The largest supported prime. Constructing a `ValidPrime` using any number larger \
         than this value will fail.",
    );
    writer.add_value("MAX_PRIME", "usize", max_prime);
    writer.add_raw(
        "/// A sentinel value. `PRIME_TO_INDEX_MAP[i] == NOT_A_PRIME` if and only if `i` is less \
         than `MAX_PRIME` and not a prime number.",
    );
    writer.add_value("NOT_A_PRIME", "usize", not_a_prime);
    writer.add_raw("/// An array containing every supported prime, in increasing order.");
    writer.add_array("PRIMES", "u32", &primes);
    writer.add_raw(
        "/// For any integer `i` less than or equal to `MAX_PRIME`, `PRIME_TO_INDEX_MAP[i]` is \
         the index of `i` in `PRIMES` if `i` is prime; otherwise, it is `NOT_A_PRIME`.",
    );
    writer.add_array("PRIME_TO_INDEX_MAP", "usize", &prime_to_index_map);

    writer.add_raw(&format!(
        "pub(crate) type Limb = {};",
        std::any::type_name::<Limb>()
    ));
    writer.add_raw("/// The number of bytes each `Limb` occupies.");
    writer.add_value("BYTES_PER_LIMB", "usize", bytes_per_limb);
    writer.add_raw("/// The number of bits each `Limb` occupies.");
    writer.add_value("BITS_PER_LIMB", "usize", bits_per_limb);
    writer.add_raw("/// The number of entries the batched encoding processes at once.");
    writer.add_value("BATCH_LANES", "usize", BATCH_LANES);

    Ok(())
}

fn primes_up_to(n: u32) -> Vec<u32> {
    (2..=n).filter(|&i| is_prime(i)).collect()
}

fn is_prime(i: u32) -> bool {
    (2..i).all(|k| i % k != 0)
}
