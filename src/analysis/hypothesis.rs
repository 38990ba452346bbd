//! Significance tests.
//!
//! Pearson chi-squared tests (independence and goodness of fit), the
//! two-sample Kolmogorov-Smirnov test and Bonferroni correction.

use crate::error::StatsError;
use crate::models::{PairwiseResult, TestResult};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::f64::consts::PI;

/// Note attached when the filtered contingency table holds no counts.
pub const NO_VARIATION: &str = "No variation in data";
/// Note attached when some expected frequency is zero.
pub const SPARSE_DATA: &str = "Chi-squared test not applicable due to sparse data";
/// Note attached to a ranking question nobody answered.
pub const NO_RESPONSES: &str = "No ranking responses";

/// Largest sample for which the KS p-value is computed exactly.
pub const KS_EXACT_MAX_N: usize = 10_000;

fn chi2_sf(stat: f64, df: f64) -> Result<f64, StatsError> {
    let dist = ChiSquared::new(df).map_err(|_| StatsError::DegreesOfFreedom(df))?;
    Ok(dist.sf(stat).clamp(0.0, 1.0))
}

/// Remove columns whose total across all rows is zero.
pub fn drop_empty_columns(table: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let columns = table.iter().map(Vec::len).max().unwrap_or(0);
    let keep: Vec<usize> = (0..columns)
        .filter(|&c| table.iter().map(|row| row.get(c).copied().unwrap_or(0)).sum::<usize>() > 0)
        .collect();

    table
        .iter()
        .map(|row| keep.iter().map(|&c| row.get(c).copied().unwrap_or(0)).collect())
        .filter(|row: &Vec<usize>| !row.is_empty())
        .collect()
}

/// Chi-squared test of independence on a groups x categories table.
///
/// Zero columns are dropped first. A table without counts, or one where some
/// expected frequency is zero, yields a non-significant placeholder instead
/// of a statistic. With one degree of freedom Yates' continuity correction
/// is applied.
///
/// The placeholder reports "not significant" where the test is really
/// undefined; it is an approximation and the `note` says which case hit.
pub fn chi2_independence(table: &[Vec<usize>], alpha: f64) -> Result<TestResult, StatsError> {
    let filtered = drop_empty_columns(table);
    let total: usize = filtered.iter().flatten().sum();

    if filtered.is_empty() || total == 0 {
        return Ok(TestResult::placeholder(NO_VARIATION));
    }

    let row_sums: Vec<usize> = filtered.iter().map(|row| row.iter().sum()).collect();
    if row_sums.iter().any(|&s| s == 0) {
        return Ok(TestResult::placeholder(SPARSE_DATA));
    }

    let rows = filtered.len();
    let cols = filtered[0].len();
    let col_sums: Vec<usize> = (0..cols)
        .map(|c| filtered.iter().map(|row| row[c]).sum())
        .collect();

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Ok(TestResult::computed(0.0, 1.0, 0, alpha));
    }

    let total = total as f64;
    let mut stat = 0.0;
    for (r, row) in filtered.iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let expected = row_sums[r] as f64 * col_sums[c] as f64 / total;
            let mut observed = count as f64;
            if dof == 1 {
                let diff = expected - observed;
                observed += diff.signum() * diff.abs().min(0.5);
            }
            let d = observed - expected;
            stat += d * d / expected;
        }
    }

    let p = chi2_sf(stat, dof as f64)?;
    Ok(TestResult::computed(stat, p, dof, alpha))
}

/// Chi-squared goodness of fit against equal expected counts.
pub fn chi2_goodness_of_fit(observed: &[usize], alpha: f64) -> Result<TestResult, StatsError> {
    let k = observed.len();
    if k < 2 {
        return Err(StatsError::DegreesOfFreedom(k as f64 - 1.0));
    }

    let total: usize = observed.iter().sum();
    if total == 0 {
        return Ok(TestResult::placeholder(NO_RESPONSES));
    }

    let expected = total as f64 / k as f64;
    let stat: f64 = observed
        .iter()
        .map(|&o| {
            let d = o as f64 - expected;
            d * d / expected
        })
        .sum();

    let dof = k - 1;
    let p = chi2_sf(stat, dof as f64)?;
    Ok(TestResult::computed(stat, p, dof, alpha))
}

/// Largest gap between the two empirical CDFs, scaled by `n * m`.
fn ks_scaled_statistic(first: &[f64], second: &[f64]) -> u64 {
    let mut a = first.to_vec();
    let mut b = second.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let (n, m) = (a.len() as i64, b.len() as i64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut max_gap = 0i64;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        max_gap = max_gap.max((i as i64 * m - j as i64 * n).abs());
    }

    max_gap as u64
}

/// Probability that a random interleaving of n and m values has a scaled
/// gap of at least `gap`, by counting lattice paths that stay strictly
/// inside the band.
fn ks_exact_p(n: usize, m: usize, gap: u64) -> f64 {
    if gap == 0 {
        return 1.0;
    }

    let inside = |i: usize, j: usize| ((i * m) as i64 - (j * n) as i64).unsigned_abs() < gap;

    // row[j] holds paths(i, j) / C(i + j, i)
    let mut row = vec![0.0f64; m + 1];
    for i in 0..=n {
        for j in 0..=m {
            if !inside(i, j) {
                row[j] = 0.0;
                continue;
            }
            if i == 0 && j == 0 {
                row[j] = 1.0;
                continue;
            }
            let from_up = if i > 0 { row[j] * i as f64 } else { 0.0 };
            let from_left = if j > 0 { row[j - 1] * j as f64 } else { 0.0 };
            row[j] = (from_up + from_left) / (i + j) as f64;
        }
    }

    (1.0 - row[m]).clamp(0.0, 1.0)
}

/// Survival function of the limiting Kolmogorov distribution, P(K > x).
///
/// Below x = 1 the alternating series cancels badly, so the CDF is taken
/// from the Jacobi theta form instead.
fn kolmogorov_sf(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }

    if x < 1.0 {
        let w = PI * PI / (8.0 * x * x);
        let series: f64 = (1..=20)
            .map(|k| {
                let j = (2 * k - 1) as f64;
                (-j * j * w).exp()
            })
            .sum();
        let cdf = (2.0 * PI).sqrt() / x * series;
        return (1.0 - cdf).clamp(0.0, 1.0);
    }

    let mut sum = 0.0;
    for k in 1..=100u32 {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * x * x).exp();
        sum += if k % 2 == 1 { term } else { -term };
        if term < 1e-16 {
            break;
        }
    }

    (2.0 * sum).clamp(0.0, 1.0)
}

/// Asymptotic two-sample tail with the Stephens small-sample adjustment.
fn ks_asymptotic_p(n: usize, m: usize, d: f64) -> f64 {
    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    kolmogorov_sf((en + 0.12 + 0.11 / en) * d)
}

/// Two-sided two-sample Kolmogorov-Smirnov test.
///
/// The p-value is exact when neither sample exceeds [`KS_EXACT_MAX_N`]
/// values and asymptotic otherwise.
pub fn ks_two_sample(first: &[f64], second: &[f64], alpha: f64) -> Result<TestResult, StatsError> {
    if first.is_empty() {
        return Err(StatsError::EmptySample("first".to_string()));
    }
    if second.is_empty() {
        return Err(StatsError::EmptySample("second".to_string()));
    }

    let (n, m) = (first.len(), second.len());
    let gap = ks_scaled_statistic(first, second);
    let d = gap as f64 / (n * m) as f64;

    let p = if n.max(m) <= KS_EXACT_MAX_N {
        ks_exact_p(n, m, gap)
    } else {
        ks_asymptotic_p(n, m, d)
    };

    Ok(TestResult::computed(d, p, 0, alpha))
}

/// Bonferroni-adjusted p-value, capped at 1.0.
pub fn bonferroni(p_value: f64, comparisons: usize) -> f64 {
    (p_value * comparisons as f64).min(1.0)
}

/// KS test on every pair of groups, in input order, with Bonferroni
/// correction over the number of pairs.
pub fn pairwise_ks(groups: &[(String, Vec<f64>)], alpha: f64) -> Result<Vec<PairwiseResult>, StatsError> {
    let pairs: Vec<(usize, usize)> = (0..groups.len())
        .flat_map(|i| (i + 1..groups.len()).map(move |j| (i, j)))
        .collect();
    let comparisons = pairs.len();

    pairs
        .into_iter()
        .map(|(i, j)| {
            let (first, a) = &groups[i];
            let (second, b) = &groups[j];
            let mut result = ks_two_sample(a, b, alpha).map_err(|e| match e {
                StatsError::EmptySample(_) => {
                    StatsError::EmptySample(if a.is_empty() { first.clone() } else { second.clone() })
                }
                other => other,
            })?;

            let raw_scaled = result.p_value * comparisons as f64;
            result.adjusted_p_value = Some(bonferroni(result.p_value, comparisons));
            result.significant = raw_scaled < alpha;

            Ok(PairwiseResult {
                first: first.clone(),
                second: second.clone(),
                result,
            })
        })
        .collect()
}
