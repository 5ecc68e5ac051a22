//! Sample statistics and two-sample significance tests

use serde::{Deserialize, Serialize};

/// Which variance assumption the two-sample t-test makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pooled variance (equal-variance Student's t)
    Student,
    /// Unequal variances with Welch–Satterthwaite degrees of freedom
    Welch,
}

/// Outcome of a two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTest {
    pub statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-tailed p-value
    pub p_value: f64,
}

pub fn sample_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased (n - 1) sample variance; needs at least two values
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = sample_mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Round half away from zero to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Pearson correlation of two equal-length series, clamped to [-1, 1].
/// Returns 0 for mismatched lengths, fewer than two pairs, or a constant series.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }

    let n = x.len() as f64;
    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x > 0.0 && var_y > 0.0 {
        (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Independent two-sample t-test of `a` against `b`. `None` when either side has fewer than two values.
pub fn two_sample_t_test(a: &[f64], b: &[f64], kind: TestKind) -> Option<TTest> {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let mean1 = sample_mean(a)?;
    let mean2 = sample_mean(b)?;
    let var1 = sample_variance(a)?;
    let var2 = sample_variance(b)?;

    let (std_err, dof) = match kind {
        TestKind::Student => {
            let dof = n1 + n2 - 2.0;
            let pooled = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / dof;
            ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), dof)
        }
        TestKind::Welch => {
            let q1 = var1 / n1;
            let q2 = var2 / n2;
            let std_err = (q1 + q2).sqrt();
            let denom = q1 * q1 / (n1 - 1.0) + q2 * q2 / (n2 - 1.0);
            let dof = if denom > 0.0 { (q1 + q2).powi(2) / denom } else { n1 + n2 - 2.0 };
            (std_err, dof)
        }
    };

    // Both samples constant: identical means are indistinguishable, different means are certain.
    if std_err == 0.0 {
        let (statistic, p_value) = if mean1 == mean2 {
            (0.0, 1.0)
        } else {
            ((mean1 - mean2).signum() * f64::INFINITY, 0.0)
        };
        return Some(TTest { statistic, degrees_of_freedom: dof, p_value });
    }

    let statistic = (mean1 - mean2) / std_err;
    Some(TTest { statistic, degrees_of_freedom: dof, p_value: students_t_two_tailed(statistic, dof) })
}

/// Two-tailed survival probability of Student's t distribution, P(|T| >= |t|)
pub fn students_t_two_tailed(t: f64, dof: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    let x = dof / (dof + t * t);
    regularized_incomplete_beta(dof / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function I_x(a, b)
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Modified Lentz evaluation of the incomplete beta continued fraction
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

/// Natural log of the gamma function (Lanczos approximation, g = 7)
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + G + 0.5;
    let series = COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}
