//! Instance preparation shared by every probe

use hardness_core::{derive_seed, generate_with_alpha, Formula};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which random instance a probe runs on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceSpec {
    /// Number of variables.
    pub n: usize,
    /// Clause ratio.
    pub alpha: f64,
    /// Seed of the instance and of the searches run on it.
    pub seed: u64,
}

impl InstanceSpec {
    /// Instance at (n, α) from `seed`.
    pub fn new(n: usize, alpha: f64, seed: u64) -> Self {
        Self { n, alpha, seed }
    }

    /// The `index`-th independent instance at the same (n, α).
    pub fn nth(&self, index: u64) -> Self {
        Self {
            seed: derive_seed(self.seed, index),
            ..*self
        }
    }

    /// The formula for these parameters; equal parameters always yield the same
    /// formula.
    pub fn generate(&self) -> Result<Formula> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(generate_with_alpha(self.n, self.alpha, &mut rng)?)
    }

    /// Independent search stream `stream` on this instance.
    pub fn search_rng(&self, stream: u64) -> StdRng {
        StdRng::seed_from_u64(derive_seed(self.seed, stream.wrapping_add(1) << 48))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_spec_same_formula() {
        let spec = InstanceSpec::new(20, 4.26, 17);
        assert_eq!(spec.generate().unwrap(), spec.generate().unwrap());
        assert_ne!(spec.generate().unwrap(), spec.nth(1).generate().unwrap());
        assert_eq!(spec.generate().unwrap().num_clauses(), 85);
    }

    #[test]
    fn test_too_few_variables() {
        assert!(InstanceSpec::new(2, 4.0, 0).generate().is_err());
    }
}
