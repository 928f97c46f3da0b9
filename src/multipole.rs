//! Windowed multipole resonance representation.
//!
//! Resonance regions are stored as overlapping energy windows, each
//! carrying the poles active within it plus a polynomial curve fit used
//! when Doppler broadening a pole isn't worthwhile. The surrounding idiom
//! (plain structs, `Vec` fields, `Result<T, String>` construction,
//! colocated tests) matches the rest of the crate.

use num_complex::Complex64;

use crate::config::SQRT_PI;

/// Resonance formalism a `MultipoleArray` was fit under. Dispatches the
/// pole-residue layout at the type level instead of branching on an
/// integer tag inside the per-pole loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formalism {
    Mlbw,
    Rm,
}

/// Per-pole residues, one variant per formalism. MLBW carries an extra
/// competitive-reaction residue `rx` that RM folds into `rt`.
#[derive(Debug, Clone, Copy)]
pub enum PoleResidues {
    Mlbw {
        rt: Complex64,
        rx: Complex64,
        ra: Complex64,
        rf: Complex64,
    },
    Rm {
        rt: Complex64,
        ra: Complex64,
        rf: Complex64,
    },
}

/// A single resonance pole: its complex energy location and residues.
#[derive(Debug, Clone, Copy)]
pub struct Pole {
    pub ea: Complex64,
    pub l_value: usize,
    pub residues: PoleResidues,
}

/// Per-window curve-fit polynomial coefficients for the three smooth-
/// background channels (total, absorption, fission), in powers of `sqrtE`.
#[derive(Debug, Clone, Default)]
pub struct Curvefit {
    pub total: Vec<f64>,
    pub absorption: Vec<f64>,
    pub fission: Vec<f64>,
}

/// Windowed multipole resonance data for one nuclide.
#[derive(Debug, Clone)]
pub struct MultipoleArray {
    pub start_e: f64,
    pub end_e: f64,
    /// Window spacing in units of sqrt(E).
    pub spacing: f64,
    /// Inclusive pole-index range `[w_start[i], w_end[i]]` covered by window `i`.
    pub w_start: Vec<usize>,
    pub w_end: Vec<usize>,
    /// Whether window `i`'s curve fit should be Doppler-broadened.
    pub broaden_poly: Vec<bool>,
    /// Curve fit coefficients per window, lowest order first.
    pub curvefit: Vec<Curvefit>,
    pub poles: Vec<Pole>,
    pub num_l: usize,
    /// Hard-sphere phase-shift scale `k0 * R` per angular-momentum index `l`.
    pub pseudo_k0rs: Vec<f64>,
    pub sqrt_awr: f64,
    pub fit_order: usize,
    pub fissionable: bool,
    pub formalism: Formalism,
}

impl MultipoleArray {
    /// Window index containing `sqrt_e`, clamped to the array's range.
    fn window_index(&self, sqrt_e: f64) -> usize {
        let n_windows = self.w_start.len();
        if n_windows == 0 {
            return 0;
        }
        let i = ((sqrt_e - self.start_e.sqrt()) / self.spacing).floor();
        if i < 0.0 {
            0
        } else {
            (i as usize).min(n_windows - 1)
        }
    }
}

/// Angular-momentum-dependent complex phase factor for the multipole total
/// cross section.
pub fn sig_t_factor(pseudo_k0rs: &[f64], sqrt_e: f64) -> Vec<Complex64> {
    pseudo_k0rs
        .iter()
        .enumerate()
        .map(|(idx, &k0rs)| {
            let l = idx + 1;
            let phi = k0rs * sqrt_e;
            let phi = match l {
                1 => phi,
                2 => phi - phi.atan(),
                3 => phi - (3.0 * phi / (3.0 - phi * phi)).atan(),
                4 => phi - (phi * (15.0 - phi * phi) / (15.0 - 6.0 * phi * phi)).atan(),
                _ => phi,
            };
            Complex64::new((2.0 * phi).cos(), -(2.0 * phi).sin())
        })
        .collect()
}

/// Faddeeva function `w(z) = exp(-z^2) erfc(-iz)`, evaluated via the
/// Humlicek (1982) four-region rational approximation. Valid for `Im(z) >= 0`,
/// which always holds here since `Im(z) = 0` (poles are evaluated with a
/// real argument shifted by the Doppler width).
pub fn faddeeva(z: Complex64) -> Complex64 {
    let x = z.re;
    let y = z.im.abs();
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    let w = if s >= 15.0 {
        t * (0.5641896 / (0.5 + t * t))
    } else if s >= 5.5 {
        let u = t * t;
        t * (Complex64::new(1.410474, 0.0) + u * 0.5641896)
            / (Complex64::new(0.75, 0.0) + u * (Complex64::new(3.0, 0.0) + u))
    } else if y >= 0.195 * x.abs() - 0.176 {
        let num = Complex64::new(16.4955, 0.0)
            + t * (Complex64::new(20.20933, 0.0)
                + t * (Complex64::new(11.96482, 0.0)
                    + t * (Complex64::new(3.778987, 0.0) + t * Complex64::new(0.5642236, 0.0))));
        let den = Complex64::new(16.4955, 0.0)
            + t * (Complex64::new(38.82363, 0.0)
                + t * (Complex64::new(39.27121, 0.0)
                    + t * (Complex64::new(21.69274, 0.0)
                        + t * (Complex64::new(6.699398, 0.0) + t))));
        num / den
    } else {
        let u = t * t;
        let num = u.exp()
            - t * (Complex64::new(36183.31, 0.0)
                - u * (Complex64::new(3321.9905, 0.0)
                    - u * (Complex64::new(1540.787, 0.0)
                        - u * (Complex64::new(219.0313, 0.0)
                            - u * (Complex64::new(35.76683, 0.0)
                                - u * (Complex64::new(1.320522, 0.0) - u * 0.56419))))));
        let den = Complex64::new(32066.6, 0.0)
            - u * (Complex64::new(24322.84, 0.0)
                - u * (Complex64::new(9022.228, 0.0)
                    - u * (Complex64::new(2186.181, 0.0)
                        - u * (Complex64::new(364.2191, 0.0)
                            - u * (Complex64::new(61.57037, 0.0)
                                - u * (Complex64::new(1.841439, 0.0) - u))))));
        num / den
    };

    if z.im >= 0.0 {
        w
    } else {
        // w(-conj(z)) = conj(w(z)) is used to reflect into the upper
        // half-plane; w(z) for Im(z) < 0 follows from w(z) = 2exp(-z^2) - w(-z).
        2.0 * (-z * z).exp() - w.conj()
    }
}

/// First derivative `w'(z) = -2z w(z) + 2i/sqrt(pi)`, from the defining
/// ODE `w' + 2z w = 2i/sqrt(pi)` (differentiate `w = exp(-z^2) erfc(-iz)`).
pub fn faddeeva_prime(z: Complex64) -> Complex64 {
    -2.0 * z * faddeeva(z) + Complex64::new(0.0, 2.0 / SQRT_PI)
}

/// Second derivative `w''(z) = (4z^2 - 2) w(z) - 4iz/sqrt(pi)`, obtained by
/// differentiating the `w'(z)` relation above.
pub fn faddeeva_double_prime(z: Complex64) -> Complex64 {
    (4.0 * z * z - Complex64::new(2.0, 0.0)) * faddeeva(z) - Complex64::new(0.0, 4.0) * z / SQRT_PI
}

/// Doppler-broadened polynomial coefficients `p_k(E; dopp)` for `k = 0..=fit_order`,
/// consumed by the curve-fit contribution to `MultipoleEval`. This is an
/// external collaborator in principle (a tabulated nuclear-data library
/// supplies it); the default implementation broadens the raw basis
/// `invE * sqrtE^k` against a Maxwellian via the truncated-Gaussian-moment
/// recursion, matching the raw (unbroadened) evaluation as `dopp -> infinity`.
pub trait DopplerBroadener {
    fn broaden(&self, e: f64, dopp: f64, fit_order: usize) -> Vec<f64>;
}

/// Default moment-recursion broadener.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolynomialBroadener;

impl DopplerBroadener for PolynomialBroadener {
    fn broaden(&self, e: f64, dopp: f64, fit_order: usize) -> Vec<f64> {
        let sqrt_e = e.sqrt();
        let beta = dopp * sqrt_e;
        let erf_beta = erf(beta);
        let exp_m_beta2 = (-beta * beta).exp();

        let n = fit_order + 1;
        let mut f = vec![0.0_f64; n.max(2)];
        f[0] = erf_beta;
        if n > 1 {
            f[1] = exp_m_beta2 / SQRT_PI;
        }
        for k in 2..n {
            f[k] = 0.5 * (k as f64 - 1.0) * f[k - 2] + beta.powi(k as i32 - 1) * exp_m_beta2 / SQRT_PI;
        }
        f.truncate(n);
        f.iter()
            .enumerate()
            .map(|(k, &fk)| fk / (e * dopp.powi(k as i32)))
            .collect()
    }
}

/// Error function via the Abramowitz & Stegun 7.1.26 rational approximation
/// (absolute error < 1.5e-7), used by the default Doppler broadener.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
    sign * y
}

/// Cross sections produced by one `MultipoleEval` or `MultipoleDerivEval` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipoleXs {
    pub total: f64,
    pub absorption: f64,
    pub fission: f64,
}

/// Evaluate windowed multipole total/absorption/fission at `(e, sqrt_kt)`.
/// `sqrt_kt == 0.0` selects the 0 K asymptotic form.
pub fn multipole_eval(
    mp: &MultipoleArray,
    broadener: &dyn DopplerBroadener,
    e: f64,
    sqrt_kt: f64,
) -> MultipoleXs {
    let sqrt_e = e.sqrt();
    let inv_e = 1.0 / e;
    let iw = mp.window_index(sqrt_e);
    let (lo, hi) = (mp.w_start[iw], mp.w_end[iw]);

    let factors = if lo <= hi {
        sig_t_factor(&mp.pseudo_k0rs, sqrt_e)
    } else {
        Vec::new()
    };

    let mut out = MultipoleXs::default();

    // Curve-fit contribution.
    let cf = &mp.curvefit[iw];
    if sqrt_kt != 0.0 && mp.broaden_poly[iw] {
        let dopp = mp.sqrt_awr / sqrt_kt;
        let p = broadener.broaden(e, dopp, mp.fit_order);
        for (k, &pk) in p.iter().enumerate() {
            out.total += cf.total.get(k).copied().unwrap_or(0.0) * pk;
            out.absorption += cf.absorption.get(k).copied().unwrap_or(0.0) * pk;
            if mp.fissionable {
                out.fission += cf.fission.get(k).copied().unwrap_or(0.0) * pk;
            }
        }
    } else {
        for k in 0..=mp.fit_order {
            let basis = inv_e * sqrt_e.powi(k as i32);
            out.total += cf.total.get(k).copied().unwrap_or(0.0) * basis;
            out.absorption += cf.absorption.get(k).copied().unwrap_or(0.0) * basis;
            if mp.fissionable {
                out.fission += cf.fission.get(k).copied().unwrap_or(0.0) * basis;
            }
        }
    }

    // Pole contribution.
    if sqrt_kt == 0.0 && lo <= hi {
        for pole in &mp.poles[lo..=hi.min(mp.poles.len().saturating_sub(1))] {
            let psi_chi = -Complex64::new(0.0, 1.0) / (pole.ea - sqrt_e);
            let c = psi_chi * inv_e;
            let l_factor = factors.get(pole.l_value.saturating_sub(1)).copied().unwrap_or(Complex64::new(1.0, 0.0));
            match pole.residues {
                PoleResidues::Mlbw { rt, rx, ra, rf } => {
                    out.total += (rt * c * l_factor + rx * c).re;
                    out.absorption += (ra * c).re;
                    if mp.fissionable {
                        out.fission += (rf * c).re;
                    }
                }
                PoleResidues::Rm { rt, ra, rf } => {
                    out.total += (rt * c * l_factor).re;
                    out.absorption += (ra * c).re;
                    if mp.fissionable {
                        out.fission += (rf * c).re;
                    }
                }
            }
        }
    } else if lo <= hi {
        let dopp = mp.sqrt_awr / sqrt_kt;
        for pole in &mp.poles[lo..=hi.min(mp.poles.len().saturating_sub(1))] {
            let z = (sqrt_e - pole.ea) * dopp;
            let w = faddeeva(z) * dopp * inv_e * SQRT_PI;
            let l_factor = factors.get(pole.l_value.saturating_sub(1)).copied().unwrap_or(Complex64::new(1.0, 0.0));
            match pole.residues {
                PoleResidues::Mlbw { rt, rx, ra, rf } => {
                    out.total += ((rt * l_factor + rx) * w).re;
                    out.absorption += (ra * w).re;
                    if mp.fissionable {
                        out.fission += (rf * w).re;
                    }
                }
                PoleResidues::Rm { rt, ra, rf } => {
                    out.total += (rt * w * l_factor).re;
                    out.absorption += (ra * w).re;
                    if mp.fissionable {
                        out.fission += (rf * w).re;
                    }
                }
            }
        }
    }

    out
}

/// Temperature derivative `d(sigma)/dT` via the second derivative of the
/// Faddeeva function. Fatal at `sqrt_kt == 0` (the curve fit's derivative
/// contribution is intentionally omitted, as it is negligible outside very
/// low energies).
pub fn multipole_deriv_eval(mp: &MultipoleArray, e: f64, sqrt_kt: f64) -> MultipoleXs {
    if sqrt_kt == 0.0 {
        panic!("MultipoleDerivEval requested at sqrt_kt = 0: temperature derivative is undefined at 0 K");
    }
    let sqrt_e = e.sqrt();
    let inv_e = 1.0 / e;
    let iw = mp.window_index(sqrt_e);
    let (lo, hi) = (mp.w_start[iw], mp.w_end[iw]);
    let factors = if lo <= hi {
        sig_t_factor(&mp.pseudo_k0rs, sqrt_e)
    } else {
        Vec::new()
    };

    let mut out = MultipoleXs::default();
    if lo <= hi {
        let dopp = mp.sqrt_awr / sqrt_kt;
        for pole in &mp.poles[lo..=hi.min(mp.poles.len().saturating_sub(1))] {
            let z = (sqrt_e - pole.ea) * dopp;
            let w_val = -inv_e * SQRT_PI * 0.5 * faddeeva_double_prime(z);
            let l_factor = factors.get(pole.l_value.saturating_sub(1)).copied().unwrap_or(Complex64::new(1.0, 0.0));
            match pole.residues {
                PoleResidues::Mlbw { rt, rx, ra, rf } => {
                    out.total += ((rt * l_factor + rx) * w_val).re;
                    out.absorption += (ra * w_val).re;
                    if mp.fissionable {
                        out.fission += (rf * w_val).re;
                    }
                }
                PoleResidues::Rm { rt, ra, rf } => {
                    out.total += (rt * w_val * l_factor).re;
                    out.absorption += (ra * w_val).re;
                    if mp.fissionable {
                        out.fission += (rf * w_val).re;
                    }
                }
            }
        }
    }

    let kt = sqrt_kt * sqrt_kt / crate::config::K_BOLTZMANN;
    let scale = -0.5 * mp.sqrt_awr / crate::config::K_BOLTZMANN.sqrt() * kt.powf(-1.5);
    out.total *= scale;
    out.absorption *= scale;
    out.fission *= scale;
    out
}
