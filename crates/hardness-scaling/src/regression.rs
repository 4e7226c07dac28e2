//! Log-linear growth model regression
//!
//! Two models are fitted by ordinary least squares:
//! - exponential: ln y = ln A + B·n        (y ≈ A·e^(B·n))
//! - power law:   ln y = ln A + B·ln n     (y ≈ A·n^B)
//!
//! R² is measured in log space, where the fit is linear.

use serde::{Deserialize, Serialize};

use crate::error::RegressionError;

/// y ≈ slope·x + intercept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Coefficient of determination, in [0, 1].
    pub r_squared: f64,
}

impl LinearFit {
    /// Fitted value at `x`.
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares on raw (x, y).
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Result<LinearFit, RegressionError> {
    if xs.len() != ys.len() {
        return Err(RegressionError::LengthMismatch {
            x: xs.len(),
            y: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(RegressionError::TooFewPoints(xs.len()));
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return Err(RegressionError::DegenerateInput);
    }

    let slope = sxy / sxx;
    // a constant series is fitted exactly by a flat line
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (sxy * sxy / (sxx * syy)).min(1.0)
    };

    Ok(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        r_squared,
    })
}

/// y ≈ a·e^(b·n).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialFit {
    /// Prefactor A.
    pub a: f64,
    /// Rate B per unit of n.
    pub b: f64,
    /// R² of the fit of ln y against n.
    pub r_squared: f64,
}

impl ExponentialFit {
    /// Fitted cost at `n`.
    pub fn predict(&self, n: f64) -> f64 {
        self.a * (self.b * n).exp()
    }
}

/// y ≈ a·n^b.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerFit {
    /// Prefactor A.
    pub a: f64,
    /// Exponent B.
    pub b: f64,
    /// R² of the fit of ln y against ln n.
    pub r_squared: f64,
}

impl PowerFit {
    /// Fitted cost at `n`.
    pub fn predict(&self, n: f64) -> f64 {
        self.a * n.powf(self.b)
    }
}

/// Which growth model explains the data better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthModel {
    /// e^(B·n) fits at least as well as n^B.
    Exponential,
    /// n^B fits strictly better.
    Polynomial,
}

/// Both fits over the same samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    /// Exponential model.
    pub exponential: ExponentialFit,
    /// Power-law model.
    pub power: PowerFit,
    /// The model with the higher R²; ties go to exponential.
    pub preferred: GrowthModel,
}

impl ModelComparison {
    /// Exponential R² minus power-law R².
    pub fn r_squared_gap(&self) -> f64 {
        self.exponential.r_squared - self.power.r_squared
    }
}

/// Fit y ≈ a·e^(b·n).
pub fn fit_exponential(samples: &[(f64, f64)]) -> Result<ExponentialFit, RegressionError> {
    if samples.iter().any(|&(_, y)| y <= 0.0) {
        return Err(RegressionError::NonPositiveSample);
    }
    let xs: Vec<f64> = samples.iter().map(|&(n, _)| n).collect();
    let ys: Vec<f64> = samples.iter().map(|&(_, y)| y.ln()).collect();
    let fit = linear_fit(&xs, &ys)?;
    Ok(ExponentialFit {
        a: fit.intercept.exp(),
        b: fit.slope,
        r_squared: fit.r_squared,
    })
}

/// Fit y ≈ a·n^b.
pub fn fit_power(samples: &[(f64, f64)]) -> Result<PowerFit, RegressionError> {
    if samples.iter().any(|&(n, y)| n <= 0.0 || y <= 0.0) {
        return Err(RegressionError::NonPositiveSample);
    }
    let xs: Vec<f64> = samples.iter().map(|&(n, _)| n.ln()).collect();
    let ys: Vec<f64> = samples.iter().map(|&(_, y)| y.ln()).collect();
    let fit = linear_fit(&xs, &ys)?;
    Ok(PowerFit {
        a: fit.intercept.exp(),
        b: fit.slope,
        r_squared: fit.r_squared,
    })
}

/// Fit both models to (n, cost) samples and pick the better one.
pub fn compare_models(samples: &[(f64, f64)]) -> Result<ModelComparison, RegressionError> {
    let exponential = fit_exponential(samples)?;
    let power = fit_power(samples)?;
    let preferred = if exponential.r_squared >= power.r_squared {
        GrowthModel::Exponential
    } else {
        GrowthModel::Polynomial
    };
    Ok(ModelComparison {
        exponential,
        power,
        preferred,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_fit_exact_line() {
        let fit = linear_fit(&[1.0, 2.0, 3.0, 4.0], &[3.0, 5.0, 7.0, 9.0]).unwrap();
        assert_relative_eq!(fit.slope, 2.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.predict(10.0), 21.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_fit_errors() {
        assert_eq!(linear_fit(&[1.0], &[1.0]), Err(RegressionError::TooFewPoints(1)));
        assert_eq!(
            linear_fit(&[1.0, 2.0], &[1.0]),
            Err(RegressionError::LengthMismatch { x: 2, y: 1 })
        );
        assert_eq!(
            linear_fit(&[2.0, 2.0], &[1.0, 3.0]),
            Err(RegressionError::DegenerateInput)
        );
    }

    #[test]
    fn test_flat_series_is_perfect_fit() {
        let fit = linear_fit(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_power_law_recovered() {
        let samples: Vec<(f64, f64)> = [10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .map(|&n: &f64| (n, 0.005 * n.powi(3)))
            .collect();
        let cmp = compare_models(&samples).unwrap();
        assert_relative_eq!(cmp.power.r_squared, 1.0, epsilon = 1e-9);
        assert_relative_eq!(cmp.power.b, 3.0, epsilon = 1e-9);
        assert_relative_eq!(cmp.power.a, 0.005, epsilon = 1e-9);
        assert!(cmp.exponential.r_squared < cmp.power.r_squared);
        assert_eq!(cmp.preferred, GrowthModel::Polynomial);
    }

    #[test]
    fn test_exponential_recovered() {
        let samples: Vec<(f64, f64)> = [10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .map(|&n: &f64| (n, 2.0 * (0.3 * n).exp()))
            .collect();
        let cmp = compare_models(&samples).unwrap();
        assert_relative_eq!(cmp.exponential.r_squared, 1.0, epsilon = 1e-9);
        assert_relative_eq!(cmp.exponential.b, 0.3, epsilon = 1e-9);
        assert_relative_eq!(cmp.exponential.predict(60.0), 2.0 * 18.0f64.exp(), max_relative = 1e-9);
        assert!(cmp.power.r_squared < cmp.exponential.r_squared);
        assert_eq!(cmp.preferred, GrowthModel::Exponential);
        assert!(cmp.r_squared_gap() > 0.0);
    }

    /// 5, 25, 125 at n = 10, 20, 30 grows by 5x per ten variables: an exact
    /// exponential, which the power law only approximates.
    #[test]
    fn test_geometric_triplet() {
        let cmp = compare_models(&[(10.0, 5.0), (20.0, 25.0), (30.0, 125.0)]).unwrap();
        assert_relative_eq!(cmp.exponential.r_squared, 1.0, epsilon = 1e-12);
        assert!(cmp.power.r_squared > 0.97 && cmp.power.r_squared < 0.99);
        assert_eq!(cmp.preferred, GrowthModel::Exponential);
    }

    #[test]
    fn test_cubic_triplet_prefers_power_law() {
        let cmp = compare_models(&[(10.0, 5.0), (20.0, 40.0), (30.0, 135.0)]).unwrap();
        assert!(cmp.power.r_squared > 0.99);
        assert_eq!(cmp.preferred, GrowthModel::Polynomial);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(
            compare_models(&[(10.0, 0.0), (20.0, 5.0)]),
            Err(RegressionError::NonPositiveSample)
        );
        assert_eq!(
            fit_power(&[(0.0, 1.0), (2.0, 5.0)]),
            Err(RegressionError::NonPositiveSample)
        );
    }
}
