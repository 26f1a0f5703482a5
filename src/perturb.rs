//! Random perturbation of a similarity matrix, for checking how stable the
//! clustering is under slightly different data or cognacy decisions.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Binomial, Distribution};

use crate::data::model::SimilarityMatrix;
use crate::error::{Error, Result};
use crate::similarity::IDENTITY;

/// Value written in place of any perturbed entry above 100, so a perturbed
/// maximum stays distinguishable from an item's identity with itself.
pub const OVERFLOW_VALUE: f64 = 99.0;

// ---------------------------------------------------------------------------
// Distribution selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseDistribution {
    /// Integers drawn uniformly from `[-spread, spread)`.
    Uniform,
    /// `Binomial(2 * spread, 0.5) - spread`, centred on zero.
    Binomial,
}

impl FromStr for NoiseDistribution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(NoiseDistribution::Uniform),
            "binomial" => Ok(NoiseDistribution::Binomial),
            _ => Err(Error::UnknownDistribution(s.to_string())),
        }
    }
}

impl fmt::Display for NoiseDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseDistribution::Uniform => write!(f, "uniform"),
            NoiseDistribution::Binomial => write!(f, "binomial"),
        }
    }
}

// ---------------------------------------------------------------------------
// Noise model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Sampler {
    Uniform,
    Binomial(Binomial),
}

/// Parameters of the noise added per simulation.
///
/// `spread` bounds how far a cell may move; `mean` shifts every offset,
/// modelling systematically stricter (negative) or looser (positive)
/// cognacy judgements.
#[derive(Debug, Clone, Copy)]
pub struct NoiseModel {
    pub distribution: NoiseDistribution,
    pub spread: u32,
    pub mean: i32,
    sampler: Sampler,
}

impl NoiseModel {
    pub fn new(distribution: NoiseDistribution, spread: u32, mean: i32) -> Result<Self> {
        let sampler = match distribution {
            NoiseDistribution::Uniform => Sampler::Uniform,
            NoiseDistribution::Binomial => Binomial::new(2 * u64::from(spread), 0.5)
                .map(Sampler::Binomial)
                .map_err(|e| Error::InvalidNoise(e.to_string()))?,
        };
        Ok(NoiseModel {
            distribution,
            spread,
            mean,
            sampler,
        })
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> i64 {
        let spread = i64::from(self.spread);
        let offset = match self.sampler {
            // An empty range has nothing to draw from; zero spread means no noise.
            Sampler::Uniform if spread == 0 => 0,
            Sampler::Uniform => rng.gen_range(-spread..spread),
            Sampler::Binomial(b) => b.sample(rng) as i64 - spread,
        };
        offset + i64::from(self.mean)
    }

    /// Draw an `n × n` noise matrix and symmetrise it as `(N + Nᵀ) / 2`.
    pub fn noise_matrix<R: Rng>(&self, rng: &mut R, n: usize) -> NoiseMatrix {
        let raw: Vec<i64> = (0..n * n).map(|_| self.draw(rng)).collect();
        let values = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| (raw[i * n + j] + raw[j * n + i]) as f64 / 2.0)
            .collect();
        let noise = NoiseMatrix { n, values };
        debug_assert!(noise.is_symmetric());
        noise
    }
}

/// Symmetric matrix of offsets, the same shape as the similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseMatrix {
    n: usize,
    values: Vec<f64>,
}

impl NoiseMatrix {
    /// A matrix filled with one offset.
    #[cfg(test)]
    pub fn constant(n: usize, value: f64) -> Self {
        NoiseMatrix {
            n,
            values: vec![value; n * n],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

// ---------------------------------------------------------------------------
// Perturbation
// ---------------------------------------------------------------------------

/// Keep a perturbed off-diagonal value within percentage bounds.
pub fn clamp_percentage(value: f64) -> f64 {
    if value > IDENTITY {
        OVERFLOW_VALUE
    } else if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// `similarity + noise`, clamped, with the diagonal reset to 100.
pub fn perturb(similarity: &SimilarityMatrix, noise: &NoiseMatrix) -> SimilarityMatrix {
    let n = similarity.len();
    assert_eq!(n, noise.len(), "noise matrix shape must match");

    let values = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            if i == j {
                IDENTITY
            } else {
                clamp_percentage(similarity.get(i, j) + noise.get(i, j))
            }
        })
        .collect();
    SimilarityMatrix::from_values(similarity.labels().to_vec(), values)
}

/// Lazily yields `count` independently perturbed copies of a matrix.
pub struct Simulation<'a, R> {
    base: &'a SimilarityMatrix,
    model: NoiseModel,
    rng: R,
    remaining: usize,
}

impl<'a, R: Rng> Simulation<'a, R> {
    pub fn new(base: &'a SimilarityMatrix, model: NoiseModel, rng: R, count: usize) -> Self {
        Simulation {
            base,
            model,
            rng,
            remaining: count,
        }
    }
}

impl<R: Rng> Iterator for Simulation<'_, R> {
    type Item = SimilarityMatrix;

    fn next(&mut self) -> Option<SimilarityMatrix> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let noise = self.model.noise_matrix(&mut self.rng, self.base.len());
        Some(perturb(self.base, &noise))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R: Rng> ExactSizeIterator for Simulation<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("L{i}")).collect()
    }

    fn pair(off: f64) -> SimilarityMatrix {
        SimilarityMatrix::from_rows(labels(2), &[vec![100.0, off], vec![off, 100.0]])
    }

    #[test]
    fn parses_distribution_names() {
        assert_eq!("uniform".parse::<NoiseDistribution>().unwrap(), NoiseDistribution::Uniform);
        assert_eq!("Binomial".parse::<NoiseDistribution>().unwrap(), NoiseDistribution::Binomial);
        assert!(matches!(
            "gaussian".parse::<NoiseDistribution>(),
            Err(Error::UnknownDistribution(s)) if s == "gaussian"
        ));
    }

    #[test]
    fn zero_spread_leaves_matrix_unchanged() {
        let mut rng = StdRng::seed_from_u64(1);
        for distribution in [NoiseDistribution::Uniform, NoiseDistribution::Binomial] {
            let model = NoiseModel::new(distribution, 0, 0).unwrap();
            let base = pair(80.0);
            let out: Vec<_> = Simulation::new(&base, model, &mut rng, 3).collect();
            assert_eq!(out.len(), 3);
            assert!(out.iter().all(|m| *m == base));
        }
    }

    #[test]
    fn overflow_clamps_to_99() {
        let out = perturb(&pair(95.0), &NoiseMatrix::constant(2, 10.0));
        assert_eq!(out.get(0, 1), OVERFLOW_VALUE);
        assert_eq!(out.get(1, 0), OVERFLOW_VALUE);
        assert_eq!(out.get(0, 0), 100.0);
    }

    #[test]
    fn exactly_100_is_kept() {
        let out = perturb(&pair(90.0), &NoiseMatrix::constant(2, 10.0));
        assert_eq!(out.get(0, 1), 100.0);
    }

    #[test]
    fn underflow_clamps_to_zero_and_diagonal_is_reset() {
        let out = perturb(&pair(5.0), &NoiseMatrix::constant(2, -20.0));
        assert_eq!(out.get(0, 1), 0.0);
        assert_eq!(out.get(0, 0), 100.0);
        assert_eq!(out.get(1, 1), 100.0);
    }

    #[test]
    fn noise_is_symmetric_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        for distribution in [NoiseDistribution::Uniform, NoiseDistribution::Binomial] {
            let model = NoiseModel::new(distribution, 20, 5).unwrap();
            for n in [2, 5, 13] {
                let noise = model.noise_matrix(&mut rng, n);
                assert!(noise.is_symmetric());
                for i in 0..n {
                    for j in 0..n {
                        let v = noise.get(i, j);
                        assert!((-15.0..=25.0).contains(&v), "{distribution} offset {v}");
                        // Averages of two integers land on a half-step grid.
                        assert_eq!((v * 2.0).fract(), 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn uniform_never_reaches_upper_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        let model = NoiseModel::new(NoiseDistribution::Uniform, 1, 0).unwrap();
        for _ in 0..100 {
            let noise = model.noise_matrix(&mut rng, 4);
            for i in 0..4 {
                // Raw draws are -1 or 0, so the average never exceeds 0.
                assert!(noise.get(i, i) <= 0.0);
            }
        }
    }

    #[test]
    fn binomial_is_centred_on_mean() {
        let mut rng = StdRng::seed_from_u64(9);
        let model = NoiseModel::new(NoiseDistribution::Binomial, 10, -3).unwrap();
        let noise = model.noise_matrix(&mut rng, 60);
        let total: f64 = (0..60)
            .flat_map(|i| (0..60).map(move |j| (i, j)))
            .map(|(i, j)| noise.get(i, j))
            .sum();
        let avg = total / 3600.0;
        assert!((avg + 3.0).abs() < 0.5, "average offset {avg}");
    }

    #[test]
    fn perturbed_matrices_stay_valid() {
        let mut rng = StdRng::seed_from_u64(5);
        let n = 6;
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 100.0 } else { ((i + j) * 17 % 101) as f64 })
                    .collect()
            })
            .collect();
        let base = SimilarityMatrix::from_rows(labels(n), &rows);
        let model = NoiseModel::new(NoiseDistribution::Uniform, 30, 10).unwrap();

        for m in Simulation::new(&base, model, &mut rng, 25) {
            assert!(m.is_symmetric());
            for i in 0..n {
                assert_eq!(m.get(i, i), 100.0);
                for j in 0..n {
                    assert!((0.0..=100.0).contains(&m.get(i, j)));
                }
            }
        }
    }
}
