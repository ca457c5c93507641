//! q-state spin grid on an L×L periodic square lattice.

use rand::Rng;

/// Spin value in `[0, q)`.
pub type Spin = u8;

/// Largest q a [`Spin`] can hold.
pub const MAX_Q: usize = Spin::MAX as usize + 1;

/// An L×L grid of q-state spins, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    l: usize,
    q: usize,
    spins: Vec<Spin>,
}

impl Lattice {
    /// Hot start: every site drawn independently and uniformly from `[0, q)`,
    /// using a caller‑supplied RNG (the job's own stream).
    ///
    /// `l` and `q` are validated by the caller (`SimulationParameters`).
    pub fn random_with(rng: &mut impl Rng, l: usize, q: usize) -> Self {
        debug_assert!(l >= 1 && (2..=MAX_Q).contains(&q));
        let spins = (0..l * l).map(|_| rng.gen_range(0..q) as Spin).collect();
        Self { l, q, spins }
    }

    /// Cold start: every site holds `state`.
    pub fn uniform(l: usize, q: usize, state: Spin) -> Self {
        debug_assert!((state as usize) < q);
        Self { l, q, spins: vec![state; l * l] }
    }

    /// Build from explicit row-major spins. Returns `None` when the length is
    /// not `l * l` or a spin lies outside `[0, q)`.
    pub fn from_spins(l: usize, q: usize, spins: Vec<Spin>) -> Option<Self> {
        if l == 0 || q < 2 || q > MAX_Q || spins.len() != l * l {
            return None;
        }
        if spins.iter().any(|&s| s as usize >= q) {
            return None;
        }
        Some(Self { l, q, spins })
    }

    /// Linear size L.
    #[inline(always)]
    pub fn l(&self) -> usize {
        self.l
    }

    /// Number of states q.
    #[inline(always)]
    pub fn q(&self) -> usize {
        self.q
    }

    /// Number of sites L².
    #[inline(always)]
    pub fn n_sites(&self) -> usize {
        self.spins.len()
    }

    /// Row-major view of all spins.
    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> Spin {
        self.spins[i * self.l + j]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, s: Spin) {
        debug_assert!((s as usize) < self.q);
        self.spins[i * self.l + j] = s;
    }

    /// Spins at (i, j+1), (i, j−1), (i+1, j), (i−1, j), all modulo L.
    ///
    /// Returned by value so the Metropolis inner loop never allocates.
    #[inline(always)]
    pub fn neighbors(&self, i: usize, j: usize) -> [Spin; 4] {
        let l = self.l;
        let right = if j + 1 == l { 0 } else { j + 1 };
        let left = if j == 0 { l - 1 } else { j - 1 };
        let down = if i + 1 == l { 0 } else { i + 1 };
        let up = if i == 0 { l - 1 } else { i - 1 };
        [
            self.get(i, right),
            self.get(i, left),
            self.get(down, j),
            self.get(up, j),
        ]
    }

    /// Occupation count of each state.
    pub fn state_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.q];
        for &s in &self.spins {
            counts[s as usize] += 1;
        }
        counts
    }
}
