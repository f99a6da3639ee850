//! Chi-square quantile (inverse CDF) for gating thresholds.
//!
//! The quantile is seeded with the Wilson-Hilferty cube-root normal
//! approximation and polished with Newton iterations against the regularized
//! lower incomplete gamma function, so the result is accurate to machine-level
//! tolerance rather than table precision.

const EPS: f64 = 1e-14;
const MAX_NEWTON: usize = 64;

/// Quantile of the chi-square distribution with `dof` degrees of freedom at
/// probability `p`, i.e. the x with CDF(x) = p.
///
/// # Panics
/// Panics if `p` is outside (0, 1) or `dof` is zero.
pub fn quantile(p: f64, dof: usize) -> f64 {
    assert!(p > 0.0 && p < 1.0, "probability must be in (0, 1), got {p}");
    assert!(dof >= 1, "degrees of freedom must be >= 1");

    let k = dof as f64;
    let a = 0.5 * k;

    // Wilson-Hilferty: (X/k)^(1/3) is approximately normal with
    // mean 1 - 2/(9k) and variance 2/(9k).
    let z = normal_quantile(p);
    let t = 2.0 / (9.0 * k);
    let mut x = k * (1.0 - t + z * t.sqrt()).powi(3);
    if x <= 0.0 {
        x = 0.5 * k;
    }

    // Newton: solve P(a, x/2) = p, derivative is the chi-square pdf.
    for _ in 0..MAX_NEWTON {
        let f = gamma_p(a, 0.5 * x) - p;
        let ln_pdf = (a - 1.0) * (0.5 * x).ln() - 0.5 * x - ln_gamma(a);
        let pdf = 0.5 * ln_pdf.exp();
        if pdf <= 0.0 || !pdf.is_finite() {
            break;
        }
        let step = f / pdf;
        let next = x - step;
        // Keep the iterate in the support.
        x = if next > 0.0 { next } else { 0.5 * x };
        if step.abs() < EPS * x.max(1.0) {
            break;
        }
    }
    x
}

/// Inverse standard-normal CDF, Abramowitz & Stegun 26.2.23 rational
/// approximation (|error| < 4.5e-4, plenty for a Newton seed).
fn normal_quantile(p: f64) -> f64 {
    let (pp, sign) = if p < 0.5 { (p, -1.0) } else { (1.0 - p, 1.0) };
    let t = (-2.0 * pp.ln()).sqrt();
    let num = 2.515517 + t * (0.802853 + t * 0.010328);
    let den = 1.0 + t * (1.432788 + t * (0.189269 + t * 0.001308));
    sign * (t - num / den)
}

/// Regularized lower incomplete gamma function P(a, x).
/// Series expansion for x < a + 1, continued fraction otherwise.
fn gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        gamma_p_series(a, x)
    } else {
        1.0 - gamma_q_cf(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..500 {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// Upper regularized incomplete gamma Q(a, x) via modified Lentz continued
/// fraction.
fn gamma_q_cf(a: f64, x: f64) -> f64 {
    const FPMIN: f64 = 1e-300;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..500 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
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
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// ln Γ(x) via the Lanczos approximation.
fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
