//! Asset class reference data.
//!
//! An [`AssetUniverse`] is read-only input provided by the configuration
//! collaborator: per-class return/volatility assumptions plus a pairwise
//! correlation matrix. It is shared freely across worker threads.

use serde::{Deserialize, Serialize};

/// Annual return assumptions for one asset class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetClassProfile {
    pub name: String,
    /// Expected annual return (arithmetic).
    pub expected_return: f64,
    /// Annual volatility.
    pub volatility: f64,
}

impl AssetClassProfile {
    #[must_use]
    pub fn new(name: &str, expected_return: f64, volatility: f64) -> Self {
        Self {
            name: name.to_string(),
            expected_return,
            volatility,
        }
    }
}

/// The asset classes a portfolio allocates over, plus their correlation
/// structure. Symmetry and positive semi-definiteness are enforced during
/// validation and factorization respectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetUniverse {
    pub assets: Vec<AssetClassProfile>,
    /// Pairwise correlation matrix, row-major, `assets.len()` square.
    pub correlations: Vec<Vec<f64>>,
}

impl AssetUniverse {
    #[must_use]
    pub fn new(assets: Vec<AssetClassProfile>, correlations: Vec<Vec<f64>>) -> Self {
        Self {
            assets,
            correlations,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Standard four-class US-centric universe.
    ///
    /// Calibration follows long-run annual series:
    /// - US large cap: mean 0.1147, std 0.1815 (S&P 500 total return, 1927-2023)
    /// - Intl developed: mean 0.0778, std 0.1883 (Fama-French, 1991-2024)
    /// - US long bonds: mean 0.0477, std 0.0701 (1927-2023)
    /// - US T-bills: mean 0.0342, std 0.0305 (1934-2025)
    #[must_use]
    pub fn balanced_us() -> Self {
        Self {
            assets: vec![
                AssetClassProfile::new("us_equity", 0.1147, 0.1815),
                AssetClassProfile::new("intl_equity", 0.0778, 0.1883),
                AssetClassProfile::new("us_bonds", 0.0477, 0.0701),
                AssetClassProfile::new("cash", 0.0342, 0.0305),
            ],
            correlations: vec![
                vec![1.00, 0.78, 0.05, -0.02],
                vec![0.78, 1.00, 0.08, -0.03],
                vec![0.05, 0.08, 1.00, 0.20],
                vec![-0.02, -0.03, 0.20, 1.00],
            ],
        }
    }
}
