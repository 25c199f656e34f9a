use crate::model::{ConfidenceLevel, PriceBand, PriceDistribution, PricePoint, ReliabilityScore};

/// Minimum sample count before the spread of prices is assessed at all.
const MIN_SAMPLES: usize = 5;
/// Sample count at which the size subscore saturates.
const OPTIMAL_SAMPLES: usize = 30;
/// Coefficient of variation considered acceptable inside the central band.
const ACCEPTABLE_CV: f64 = 0.3;

pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Population mean/std-dev based outlier detection and price banding.
    ///
    /// An element is an outlier iff it lies more than two standard
    /// deviations from the mean. Empty input yields a degenerate report
    /// with `mean = NaN` and no bands; callers are expected to guard.
    pub fn analyze_distribution(prices: &[f64]) -> PriceDistribution {
        if prices.is_empty() {
            return PriceDistribution {
                outliers: Vec::new(),
                bands: Vec::new(),
                mean: f64::NAN,
                std_dev: f64::NAN,
            };
        }

        let mean = Self::mean(prices);
        let std_dev = Self::population_std_dev(prices, mean);

        let outliers: Vec<f64> = prices
            .iter()
            .copied()
            .filter(|p| (p - mean).abs() > 2.0 * std_dev)
            .collect();

        let bands = vec![
            PriceBand {
                label: "budget",
                lower: 0.0,
                upper: mean - std_dev,
            },
            PriceBand {
                label: "typical",
                lower: mean - std_dev,
                upper: mean + std_dev,
            },
            PriceBand {
                label: "elevated",
                lower: mean + std_dev,
                upper: mean + 2.0 * std_dev,
            },
            PriceBand {
                label: "premium",
                lower: mean + 2.0 * std_dev,
                upper: f64::INFINITY,
            },
        ];

        PriceDistribution {
            outliers,
            bands,
            mean,
            std_dev,
        }
    }

    /// Heuristic 0-100 confidence score for a sold-price sample, blending
    /// sample size (up to 50 points) with the tightness of the central
    /// inter-quartile band (up to 50 points).
    pub fn score_reliability(samples: &[PricePoint]) -> ReliabilityScore {
        let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();
        let count = prices.len();

        let sample_score = (count as f64 / OPTIMAL_SAMPLES as f64 * 50.0).min(50.0);

        let dispersion_score = if count < MIN_SAMPLES {
            0.0
        } else {
            let mut sorted = prices.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            // Nearest-rank quartiles, no interpolation.
            let q1 = sorted[(count as f64 * 0.25).floor() as usize];
            let q3 = sorted[(count as f64 * 0.75).floor() as usize];

            let central: Vec<f64> = prices
                .iter()
                .copied()
                .filter(|p| *p >= q1 && *p <= q3)
                .collect();
            let central_ratio = central.len() as f64 / count as f64;
            let central_cv = Self::coefficient_of_variation(&central);

            30.0 * (central_ratio / 0.5).min(1.0) + 20.0 * (1.0 - (central_cv / ACCEPTABLE_CV).min(1.0))
        };

        let total = (sample_score + dispersion_score).round().clamp(0.0, 100.0) as u8;

        let confidence = if total >= 70 {
            ConfidenceLevel::High
        } else if total >= 30 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        };

        let mut warnings = Vec::new();
        if count < MIN_SAMPLES {
            warnings.push("too few samples for a dependable estimate".to_string());
        } else if count < OPTIMAL_SAMPLES {
            warnings.push("more data improves accuracy".to_string());
        }

        ReliabilityScore {
            score: total,
            confidence,
            warnings,
        }
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn population_std_dev(values: &[f64], mean: f64) -> f64 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
    }

    /// stddev/mean over the central band. Defined as 0 when the band has at
    /// most one distinct value or a zero mean, so a flat price list never
    /// divides by zero.
    fn coefficient_of_variation(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let first = values[0];
        if values.iter().all(|v| *v == first) {
            return 0.0;
        }
        let mean = Self::mean(values);
        if mean == 0.0 {
            return 0.0;
        }
        Self::population_std_dev(values, mean) / mean
    }
}
