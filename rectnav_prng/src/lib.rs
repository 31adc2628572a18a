// Seeded pseudo-random source for obstacle scattering and endpoint picking.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. Kept in its own crate so the mesh library and the CLI
// draw from one generator and a given seed always reproduces the same
// obstacle layout, on every platform.
//
// See also: `rectnav_mesh::scatter`, which is the main consumer, and
// `rectnav_mesh::mesh::NavMesh::pick_endpoints`.
//
// **Critical constraint: reproducibility.** A mesh built from
// `(config, seed)` must be identical across runs. No OS entropy, no
// floating point inside the core generator.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ generator. Cheap to clone; clones continue the same stream
/// independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshRng {
    s: [u64; 4],
}

impl MeshRng {
    /// Create a generator from a `u64` seed. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo
    /// bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform index in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }
}

/// SplitMix64 step, used only to expand the seed into generator state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
