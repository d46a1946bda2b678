//! Product replacement random element generation.

use crate::perm::{Perm, PermSet};

const DEFAULT_SLOTS: usize = 10;
const DEFAULT_WARMUP: usize = 20;

/// Random group element generator over a generating set.
///
/// Slot 0 is the accumulator, the remaining slots are seeded from the
/// generators with cyclic padding up to the slot minimum. Every `next`
/// replaces a random slot by its product with another random slot (or its
/// inverse), on a random side, and folds the result into the accumulator.
/// The element distribution converges towards uniform over the generated
/// group after warm-up.
pub struct PrRandomizer {
    slots: Vec<Perm>,
    rng: fastrand::Rng,
    odd_generator: bool,
}

impl PrRandomizer {
    /// Entropy-seeded randomizer with default parameters.
    #[must_use]
    pub fn new(generators: &PermSet) -> PrRandomizer {
        PrRandomizer::with_rng(generators, fastrand::Rng::new(), DEFAULT_WARMUP)
    }

    /// Randomizer over a caller-provided RNG, e.g. a fixed-seed one for
    /// reproducible runs.
    #[must_use]
    pub fn with_rng(generators: &PermSet, rng: fastrand::Rng, warmup: usize) -> PrRandomizer {
        assert!(
            !generators.is_empty(),
            "product replacement needs at least one generator"
        );

        let degree = generators.degree();

        let mut slots = Vec::with_capacity(DEFAULT_SLOTS.max(generators.len() + 1));
        slots.push(Perm::identity(degree));

        // cyclic padding if there are fewer generators than slots
        let mut i = 0;
        while slots.len() < DEFAULT_SLOTS.max(generators.len() + 1) {
            slots.push(generators[i % generators.len()].clone());
            i += 1;
        }

        let mut pr = PrRandomizer {
            slots,
            rng,
            odd_generator: generators.iter().any(is_odd),
        };

        for _ in 0..warmup {
            pr.next();
        }

        pr
    }

    /// The next pseudo-random group element.
    pub fn next(&mut self) -> Perm {
        let k = self.slots.len();

        let s = self.rng.usize(1..k);
        let mut t = self.rng.usize(1..k);
        while t == s {
            t = self.rng.usize(1..k);
        }

        let other = if self.rng.bool() {
            self.slots[t].clone()
        } else {
            self.slots[t].inverse()
        };

        if self.rng.bool() {
            let slot = &self.slots[s] * &other;
            let accumulator = &self.slots[0] * &slot;
            self.slots[s] = slot;
            self.slots[0] = accumulator;
        } else {
            let slot = &other * &self.slots[s];
            let accumulator = &slot * &self.slots[0];
            self.slots[s] = slot;
            self.slots[0] = accumulator;
        }

        self.slots[0].clone()
    }

    /// Statistical test for the generated group being the full symmetric
    /// group of its degree.
    pub fn test_symmetric(&mut self, samples: usize) -> bool {
        self.contains_alternating(samples) && self.odd_generator
    }

    /// Statistical test for the generated group being the alternating group
    /// of its degree.
    pub fn test_alternating(&mut self, samples: usize) -> bool {
        self.contains_alternating(samples) && !self.odd_generator
    }

    // Sample elements looking for a cycle of prime length l with
    // n/2 < l < n - 2. Such cycles appear with high probability in a
    // bounded number of samples from Alt(n) or Sym(n) and certify
    // containment of Alt(n) for transitive groups.
    fn contains_alternating(&mut self, samples: usize) -> bool {
        let degree = self.slots[0].degree();

        if degree < 8 {
            return false;
        }

        for _ in 0..samples {
            let element = self.next();

            if element
                .cycles()
                .iter()
                .any(|c| 2 * c.len() > degree && c.len() < degree - 2 && is_prime(c.len()))
            {
                return true;
            }
        }

        false
    }
}

fn is_odd(perm: &Perm) -> bool {
    perm.cycles().iter().map(|c| c.len() - 1).sum::<usize>() % 2 == 1
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }

    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }

    true
}
