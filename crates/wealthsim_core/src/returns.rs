//! Stochastic asset-class return generation.
//!
//! The base model draws independent standard normals, correlates them
//! through the Cholesky factor of the (repaired-if-needed) correlation
//! matrix, and applies each asset's mean and volatility. Jump and regime
//! overlays layer on top.
//!
//! Randomness is organized as one independent substream per path index,
//! derived from the master seed with a SplitMix64 mix. The same seed and
//! parameters therefore reproduce the exact ensemble no matter how paths
//! are partitioned across threads, which is also what makes common random
//! numbers valid for scenario comparison.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Poisson, StandardNormal};

use crate::correlation::factor_correlation;
use crate::model::{AssetUniverse, JumpDiffusionParams, RegimeSwitchingParams, ReturnOverlay};
use crate::validate::ValidatedParameters;

/// Derive the RNG seed for one path's substream.
#[must_use]
pub fn path_seed(master: u64, path_index: u64) -> u64 {
    let mut z = master ^ path_index.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

struct JumpOverlay {
    params: JumpDiffusionParams,
    /// Absent when intensity is zero (no jumps ever fire).
    poisson: Option<Poisson<f64>>,
}

/// Per-run return generator. Read-only once built; shared across workers.
pub struct AssetReturnModel {
    means: Vec<f64>,
    vols: Vec<f64>,
    chol: Vec<Vec<f64>>,
    regularized: bool,
    jumps: Vec<JumpOverlay>,
    regimes: Vec<RegimeSwitchingParams>,
    seed: u64,
}

impl AssetReturnModel {
    /// Build the model from validated parameters. The correlation matrix is
    /// factored once here; an indefinite matrix is projected to the nearest
    /// PSD correlation matrix rather than failing the run.
    #[must_use]
    pub fn new(validated: &ValidatedParameters, universe: &AssetUniverse, seed: u64) -> Self {
        let mean_scale = validated.params.market_assumption.mean_multiplier();
        let means = universe
            .assets
            .iter()
            .map(|a| a.expected_return * mean_scale)
            .collect();
        let vols = universe.assets.iter().map(|a| a.volatility).collect();

        let (chol, regularized) = factor_correlation(&universe.correlations);
        if regularized {
            tracing::warn!("correlation matrix was not PSD; projected before factoring");
        }

        let mut jumps = Vec::new();
        let mut regimes = Vec::new();
        for overlay in &validated.params.overlays {
            match overlay {
                ReturnOverlay::None => {}
                ReturnOverlay::JumpDiffusion(params) => {
                    let poisson = (params.annual_intensity > 0.0)
                        .then(|| Poisson::new(params.annual_intensity).ok())
                        .flatten();
                    jumps.push(JumpOverlay {
                        params: params.clone(),
                        poisson,
                    });
                }
                ReturnOverlay::RegimeSwitching(params) => regimes.push(params.clone()),
            }
        }

        Self {
            means,
            vols,
            chol,
            regularized,
            jumps,
            regimes,
            seed,
        }
    }

    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.means.len()
    }

    /// Whether the correlation matrix had to be repaired.
    #[must_use]
    pub fn regularized(&self) -> bool {
        self.regularized
    }

    /// Open the independent return substream for one path.
    #[must_use]
    pub fn stream(&self, path_index: u64) -> ReturnStream<'_> {
        ReturnStream {
            model: self,
            rng: SmallRng::seed_from_u64(path_seed(self.seed, path_index)),
            normals: vec![0.0; self.n_assets()],
            regime_states: self.regimes.iter().map(|r| r.initial_regime).collect(),
        }
    }
}

/// One path's draw sequence. Never shared between paths.
pub struct ReturnStream<'a> {
    model: &'a AssetReturnModel,
    rng: SmallRng,
    normals: Vec<f64>,
    /// Active regime index per regime overlay.
    regime_states: Vec<usize>,
}

impl ReturnStream<'_> {
    /// Generate the next period's per-asset returns into `out`.
    ///
    /// `out.len()` must equal the model's asset count.
    pub fn next_period(&mut self, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.model.n_assets());

        for z in &mut self.normals {
            *z = self.rng.sample(StandardNormal);
        }

        // Active regimes scale mean and volatility multiplicatively.
        let mut mean_mult = 1.0;
        let mut vol_mult = 1.0;
        for (overlay, &state) in self.model.regimes.iter().zip(&self.regime_states) {
            let profile = &overlay.regimes[state];
            mean_mult *= profile.mean_multiplier;
            vol_mult *= profile.volatility_multiplier;
        }

        for (i, r) in out.iter_mut().enumerate() {
            let mut shock = 0.0;
            for j in 0..=i {
                shock += self.model.chol[i][j] * self.normals[j];
            }
            *r = self.model.means[i] * mean_mult + self.model.vols[i] * vol_mult * shock;
        }

        // Jumps are market-wide shocks added to every asset's return.
        for jump in &self.model.jumps {
            if let Some(poisson) = &jump.poisson {
                let count = poisson.sample(&mut self.rng) as u64;
                if count > 0 {
                    let mut log_sum = 0.0;
                    for _ in 0..count {
                        let z: f64 = self.rng.sample(StandardNormal);
                        log_sum += jump.params.mean_log_size + jump.params.log_size_std_dev * z;
                    }
                    let magnitude = jump.params.max_magnitude.abs();
                    let jump_return = (log_sum.exp() - 1.0).clamp(-magnitude, magnitude);
                    for r in out.iter_mut() {
                        *r += jump_return;
                    }
                }
            }
        }

        // A period return below -100% has no meaning for a long-only
        // portfolio; pin at total loss.
        for r in out.iter_mut() {
            if *r < -1.0 {
                *r = -1.0;
            }
        }

        self.advance_regimes();
    }

    fn advance_regimes(&mut self) {
        for (overlay, state) in self.model.regimes.iter().zip(&mut self.regime_states) {
            let row = &overlay.transition[*state];
            let draw: f64 = self.rng.random();
            let mut cumulative = 0.0;
            for (next, &p) in row.iter().enumerate() {
                cumulative += p;
                if draw < cumulative {
                    *state = next;
                    break;
                }
            }
            // Rounding can leave `draw` past the final cumulative sum; the
            // state is then simply retained.
        }
    }
}
