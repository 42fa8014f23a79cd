use super::ModelError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// share of observations routed to each training partition. the holdout
/// (test + validate) is drawn first, then divided between test and validate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub test: f64,
    pub validate: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        SplitRatios {
            train: 0.8,
            test: 0.1,
            validate: 0.1,
        }
    }
}

impl SplitRatios {
    pub fn validate_ratios(&self) -> Result<(), ModelError> {
        let total = self.train + self.test + self.validate;
        if (total - 1.0).abs() > 1e-9 {
            return Err(ModelError::DataError(format!(
                "split ratios {}/{}/{} do not sum to 1",
                self.train, self.test, self.validate
            )));
        }
        if self.train <= 0.0 || self.test <= 0.0 || self.validate < 0.0 {
            return Err(ModelError::DataError(format!(
                "split ratios {}/{}/{} must be positive (validate may be zero)",
                self.train, self.test, self.validate
            )));
        }
        Ok(())
    }
}

/// randomly partitions row indices into (train, test, validate) with a seeded
/// generator, so a model trained twice from the same table and seed fits the
/// same rows. mirrors a two-stage mask: first draw the training share, then
/// divide the remainder between test and validation.
pub fn split_indices(
    n: usize,
    ratios: &SplitRatios,
    seed: u64,
) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train: Vec<usize> = vec![];
    let mut test: Vec<usize> = vec![];
    let mut validate: Vec<usize> = vec![];
    let holdout = ratios.test + ratios.validate;
    let test_share = if holdout > 0.0 {
        ratios.test / holdout
    } else {
        0.0
    };
    for idx in 0..n {
        if rng.random::<f64>() < ratios.train {
            train.push(idx);
        } else if rng.random::<f64>() < test_share {
            test.push(idx);
        } else {
            validate.push(idx);
        }
    }
    (train, test, validate)
}
