//! Statistical primitives for the reporting pipeline.
//!
//! Aggregates operate on the non-missing values the caller collected;
//! an empty sample yields `None`, never zero.

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Ranks with ties assigned the average rank (1-based).
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut out = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            out[idx] = avg_rank;
        }
        i = j + 1;
    }
    out
}

/// Pearson product-moment correlation. `None` when either side has zero
/// variance (the coefficient is undefined, not zero).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        sxy += (xi - mx) * (yi - my);
        sxx += (xi - mx) * (xi - mx);
        syy += (yi - my) * (yi - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Spearman rank correlation with its two-sided significance.
///
/// The coefficient is Pearson over tie-averaged ranks; the p-value comes from
/// the t transform `t = r * sqrt((n-2) / (1-r^2))` with n-2 degrees of
/// freedom. Fewer than 3 paired observations is not computable.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }
    let rho = pearson(&ranks(x), &ranks(y))?;
    if rho.abs() >= 1.0 {
        return Some((rho.clamp(-1.0, 1.0), 0.0));
    }
    let df = (n - 2) as f64;
    let t = rho * (df / (1.0 - rho * rho)).sqrt();
    Some((rho, students_t_two_sided(t, df)))
}

/// Two-sided tail probability of Student's t with `df` degrees of freedom.
pub fn students_t_two_sided(t: f64, df: f64) -> f64 {
    incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

/// Strength band plus direction, e.g. "moderate negative".
pub fn interpret(r: f64) -> String {
    let abs_r = r.abs();
    let strength = if abs_r >= 0.7 {
        "strong"
    } else if abs_r >= 0.4 {
        "moderate"
    } else if abs_r >= 0.2 {
        "weak"
    } else {
        "negligible"
    };
    let direction = if r >= 0.0 { "positive" } else { "negative" };
    format!("{strength} {direction}")
}

fn ln_gamma(x: f64) -> f64 {
    // Lanczos approximation, g=5, n=6.
    const COEF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    let mut y = x;
    for c in COEF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

// Continued fraction for the incomplete beta function (Lentz's method).
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 3.0e-14;
    const FPMIN: f64 = 1.0e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_cf(a, b, x) / a
    } else {
        1.0 - front * beta_cf(b, a, 1.0 - x) / b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_sample_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(ranks(&[10.0, 20.0, 20.0, 30.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn pearson_undefined_for_constant_input() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn spearman_perfect_monotonic() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let up = [2.0, 4.0, 6.0, 8.0, 10.0];
        let down = [10.0, 8.0, 6.0, 4.0, 2.0];

        let (rho, p) = spearman(&x, &up).unwrap();
        assert!((rho - 1.0).abs() < 1e-12);
        assert_eq!(p, 0.0);

        let (rho, _) = spearman(&x, &down).unwrap();
        assert!((rho + 1.0).abs() < 1e-12);
    }

    #[test]
    fn spearman_matches_reference_values() {
        // One swapped pair: rho = 1 - 6*2/(5*24) = 0.9, p ~ 0.0374.
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 2.0, 3.0, 5.0, 4.0];
        let (rho, p) = spearman(&x, &y).unwrap();
        assert!((rho - 0.9).abs() < 1e-12);
        assert!((p - 0.0374).abs() < 5e-3, "p = {p}");
    }

    #[test]
    fn spearman_needs_three_pairs() {
        assert_eq!(spearman(&[1.0, 2.0], &[2.0, 1.0]), None);
    }

    #[test]
    fn t_tail_probabilities() {
        // df=1 is a Cauchy: CDF(1) = 0.75, so the two-sided tail is 0.5.
        assert!((students_t_two_sided(1.0, 1.0) - 0.5).abs() < 1e-9);
        assert!((students_t_two_sided(0.0, 5.0) - 1.0).abs() < 1e-12);
        assert!(students_t_two_sided(50.0, 5.0) < 1e-6);
    }

    #[test]
    fn interpretation_bands() {
        assert_eq!(interpret(0.75), "strong positive");
        assert_eq!(interpret(-0.45), "moderate negative");
        assert_eq!(interpret(0.1), "negligible positive");
        assert_eq!(interpret(-0.2), "weak negative");
        assert_eq!(interpret(0.0), "negligible positive");
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_to(4.16666, 2), 4.17);
        assert_eq!(round_to(0.82078, 3), 0.821);
    }
}
