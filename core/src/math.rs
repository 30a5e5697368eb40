//! Scalar special functions backing the Bayesian predictors.
//!
//! Everything here is pure f64 arithmetic: the log-gamma function, the
//! Gauss hypergeometric function 2F1 on [0, 1), and the cent-rounding
//! helper shared by the monetary outputs.

/// Natural log of the gamma function for x > 0.
///
/// Reflection below 0.5, upward recursion into the asymptotic range,
/// then Stirling's series with three correction terms. Accurate to
/// roughly 1e-10 over the parameter ranges the predictors feed it.
pub fn ln_gamma(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }

    if x < 0.5 {
        // Reflection formula
        std::f64::consts::PI.ln() - (std::f64::consts::PI * x).sin().ln() - ln_gamma(1.0 - x)
    } else if x < 7.0 {
        // Recurse up to the range where Stirling converges fast
        let mut xx = x;
        let mut result = 0.0;
        while xx < 7.0 {
            result -= xx.ln();
            xx += 1.0;
        }
        result + ln_gamma(xx)
    } else {
        let x2 = x * x;
        (x - 0.5) * x.ln() - x + 0.5 * (2.0 * std::f64::consts::PI).ln() + 1.0 / (12.0 * x)
            - 1.0 / (360.0 * x2 * x)
            + 1.0 / (1260.0 * x2 * x2 * x)
    }
}

/// Gauss hypergeometric function 2F1(a, b; c; z) for 0 <= z < 1.
///
/// Direct power series: the term ratio is (a+n)(b+n)/((c+n)(n+1)) * z,
/// which converges geometrically for z < 1. The survival-likelihood
/// callers only ever produce arguments in [0, 1) because the
/// denominators are at least as large as the rate difference in the
/// numerator. Out-of-range z yields NaN.
pub fn hyp2f1(a: f64, b: f64, c: f64, z: f64) -> f64 {
    if !(0.0..1.0).contains(&z) {
        return f64::NAN;
    }
    if z == 0.0 {
        return 1.0;
    }

    const MAX_TERMS: usize = 10_000;
    const TOL: f64 = 1e-14;

    let mut term = 1.0;
    let mut sum = 1.0;
    for n in 0..MAX_TERMS {
        let nf = n as f64;
        term *= (a + nf) * (b + nf) / ((c + nf) * (nf + 1.0)) * z;
        sum += term;
        if term.abs() < TOL * sum.abs() {
            break;
        }
    }
    sum
}

/// Round a monetary amount to the nearest cent.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
