/// Derive a scoped sub-seed from the run seed (FNV-1a fold).
///
/// Each simulated year gets its own rng stream so inserting or removing a
/// sampling call in one year cannot shift every later year's draws.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
