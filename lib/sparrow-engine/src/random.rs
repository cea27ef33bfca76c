use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// The per-query-results random state behind `RAND()`, `UUID()` and fresh
/// blank-node labels.
///
/// Seeded from wall-clock time and the process id run through a
/// splitmix64-style mixer; [`RandomState::reseed`] makes test runs
/// deterministic.
pub struct RandomState {
    rng: StdRng,
}

impl RandomState {
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let seed = mix64(now ^ mix64(u64::from(process::id())));
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restarts the sequence from a fixed seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(mix64(seed));
    }

    /// A uniform double in `[0, 1)`.
    pub fn random_double(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn random_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut bytes = [0_u8; N];
        self.rng.fill(&mut bytes[..]);
        bytes
    }

    /// A version-4 UUID in its hyphenated lowercase form.
    pub fn random_uuid(&mut self) -> String {
        let mut bytes: [u8; 16] = self.random_bytes();
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        let hex = hex::encode(bytes);
        format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

impl Default for RandomState {
    fn default() -> Self {
        Self::new()
    }
}

/// Sebastiano Vigna's public-domain splitmix64 finalizer.
fn mix64(mut value: u64) -> u64 {
    value = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    value ^ (value >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reseed_is_deterministic() {
        let mut a = RandomState::new();
        let mut b = RandomState::new();
        a.reseed(42);
        b.reseed(42);
        assert_eq!(a.random_double(), b.random_double());
        assert_eq!(a.random_uuid(), b.random_uuid());
    }

    #[test]
    fn uuid_has_version_and_variant_bits() {
        let mut state = RandomState::new();
        let uuid = state.random_uuid();
        assert_eq!(uuid.len(), 36);
        assert_eq!(&uuid[14..15], "4");
        assert!(matches!(&uuid[19..20], "8" | "9" | "a" | "b"));
    }
}
