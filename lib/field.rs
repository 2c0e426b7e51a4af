//! The quantized cavity field, described by its photon-number distribution.
//!
//! Three distributions are provided:
//! - [`PhotonDist::Dirac`]: a Fock state with exactly `avg_n` photons
//! - [`PhotonDist::Poisson`]: a coherent state with mean photon number `avg_n`
//! - [`PhotonDist::BoseEinstein`]: a thermal state with mean photon number
//!   `avg_n`
//!
//! The infinite sum over photon numbers is truncated at a cutoff `cut_n`,
//! which must be large enough for the tail of the distribution to be
//! negligible.

use std::{ fmt, str::FromStr };
use serde::Deserialize;
use crate::error::{ Error, Result };

/// Largest probability allowed at the photon-number cutoff.
pub const THR_N: f64 = 0.001;

/// Photon-number probability distribution of the cavity field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum PhotonDist {
    Dirac,
    Poisson,
    BoseEinstein,
}

impl PhotonDist {
    /// All distributions.
    pub const ALL: [Self; 3] = [Self::Dirac, Self::Poisson, Self::BoseEinstein];

    /// Tag used in configuration files.
    pub fn tag(&self) -> &'static str {
        match *self {
            Self::Dirac => "Dirac",
            Self::Poisson => "Poisson",
            Self::BoseEinstein => "BoseEinstein",
        }
    }

    // resolve to the probability function
    fn pdf_fn(&self) -> fn(f64, usize) -> f64 {
        match *self {
            Self::Dirac => dirac,
            Self::Poisson => poisson,
            Self::BoseEinstein => bose_einstein,
        }
    }
}

impl fmt::Display for PhotonDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for PhotonDist {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter()
            .find(|dist| dist.tag() == s)
            .ok_or_else(|| {
                Error::InvalidFieldSpec(format!(
                    "unknown photon distribution {:?}; expected one of \
                    \"Dirac\", \"Poisson\", \"BoseEinstein\"",
                    s,
                ))
            })
    }
}

impl TryFrom<String> for PhotonDist {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> { s.parse() }
}

/// Point mass at `avg`.
pub fn dirac(avg: f64, n: usize) -> f64 {
    if n as f64 == avg { 1.0 } else { 0.0 }
}

/// Poisson distribution with mean `avg`.
///
/// Evaluated in log space so that large `n` does not overflow.
pub fn poisson(avg: f64, n: usize) -> f64 {
    if avg == 0.0 {
        return if n == 0 { 1.0 } else { 0.0 };
    }
    let ln_fact: f64 = (2..=n).map(|k| (k as f64).ln()).sum();
    (n as f64 * avg.ln() - avg - ln_fact).exp()
}

/// Bose-Einstein (geometric) distribution with mean `avg`.
pub fn bose_einstein(avg: f64, n: usize) -> f64 {
    let n = i32::try_from(n).unwrap_or(i32::MAX);
    1.0 / (1.0 + avg) * (avg / (1.0 + avg)).powi(n)
}

/// Validated description of the cavity field.
#[derive(Copy, Clone)]
pub struct Field {
    avg_n: usize,
    pdf_n: PhotonDist,
    cut_n: usize,
    pdf: fn(f64, usize) -> f64,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,
            "Field {{ avg_n: {:?}, pdf_n: {:?}, cut_n: {:?} }}",
            self.avg_n, self.pdf_n, self.cut_n,
        )
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.avg_n == other.avg_n
            && self.pdf_n == other.pdf_n
            && self.cut_n == other.cut_n
    }
}

impl Field {
    /// Create a new `Field`.
    ///
    /// Fails if `avg_n` or `cut_n` is negative, if `avg_n >= cut_n`, or if the
    /// probability at `cut_n` exceeds [`THR_N`].
    pub fn new(avg_n: i64, pdf_n: PhotonDist, cut_n: i64) -> Result<Self> {
        if avg_n < 0 {
            return Err(Error::InvalidFieldSpec(format!(
                "average number of photons (avg_n) must be non-negative, got {}",
                avg_n,
            )));
        }
        if cut_n < 0 {
            return Err(Error::InvalidFieldSpec(format!(
                "photon cutoff (cut_n) must be non-negative, got {}",
                cut_n,
            )));
        }
        if avg_n >= cut_n {
            return Err(Error::InvalidFieldSpec(format!(
                "average number of photons (avg_n = {}) must be smaller than \
                the photon cutoff (cut_n = {})",
                avg_n, cut_n,
            )));
        }
        let field = Self {
            avg_n: avg_n as usize,
            pdf_n,
            cut_n: cut_n as usize,
            pdf: pdf_n.pdf_fn(),
        };
        let tail = field.pdf(field.cut_n);
        if tail > THR_N {
            return Err(Error::InvalidFieldSpec(format!(
                "photon cutoff (cut_n = {}) is too small for a {} distribution \
                with avg_n = {} (P(cut_n) = {:.3e}); increase cut_n or \
                decrease avg_n",
                cut_n, pdf_n, avg_n, tail,
            )));
        }
        Ok(field)
    }

    /// Like [`Self::new`], taking the distribution by its tag.
    pub fn from_tag(avg_n: i64, pdf_n: &str, cut_n: i64) -> Result<Self> {
        Self::new(avg_n, pdf_n.parse()?, cut_n)
    }

    /// Average photon number.
    pub fn avg_n(&self) -> usize { self.avg_n }

    /// Photon-number distribution.
    pub fn pdf_n(&self) -> PhotonDist { self.pdf_n }

    /// Photon-number cutoff; the sum over Fock states runs over `0..cut_n`.
    pub fn cut_n(&self) -> usize { self.cut_n }

    /// Probability of finding `n` photons in the cavity.
    pub fn pdf(&self, n: usize) -> f64 { (self.pdf)(self.avg_n as f64, n) }

    /// Iterate over `(n, P(n))` for all `n` below the cutoff.
    pub fn pdf_iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.cut_n).map(|n| (n, self.pdf(n)))
    }

    /// Total probability below the cutoff.
    pub fn truncated_mass(&self) -> f64 {
        self.pdf_iter().map(|(_, p)| p).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn is_pdf(field: &Field) -> bool {
        let mut norm = 0.0;
        for (_, p) in field.pdf_iter() {
            if p < 0.0 { return false; }
            norm += p;
        }
        (norm - 1.0).abs() <= 0.01
    }

    proptest! {
        #[test]
        fn dirac_is_pdf(avg_n in 0_i64..=50, cut_n in 100_i64..=300) {
            let field = Field::new(avg_n, PhotonDist::Dirac, cut_n).unwrap();
            prop_assert!(is_pdf(&field));
        }

        #[test]
        fn poisson_is_pdf(avg_n in 0_i64..=50, cut_n in 100_i64..=300) {
            let field = Field::new(avg_n, PhotonDist::Poisson, cut_n).unwrap();
            prop_assert!(is_pdf(&field));
        }

        #[test]
        fn bose_einstein_is_pdf(avg_n in 0_i64..=20, cut_n in 100_i64..=300) {
            let field
                = Field::new(avg_n, PhotonDist::BoseEinstein, cut_n).unwrap();
            prop_assert!(is_pdf(&field));
        }

        #[test]
        fn dirac_props(
            avg_n in 0_i64..=50,
            cut_n in 100_i64..=300,
            n in 0_usize..=100,
        ) {
            let field = Field::new(avg_n, PhotonDist::Dirac, cut_n).unwrap();
            prop_assert_eq!(field.pdf(avg_n as usize), 1.0);
            if n != avg_n as usize {
                prop_assert_eq!(field.pdf(n), 0.0);
            }
        }

        #[test]
        fn poisson_props(
            avg_n in 0_i64..=50,
            cut_n in 100_i64..=300,
            n in 0_usize..=100,
        ) {
            let field = Field::new(avg_n, PhotonDist::Poisson, cut_n).unwrap();
            if avg_n != 0 {
                prop_assert!(field.pdf(n) > 0.0);
            } else {
                prop_assert_eq!(field.pdf(n), dirac(0.0, n));
            }
        }

        #[test]
        fn bose_einstein_props(
            avg_n in 0_i64..=20,
            cut_n in 100_i64..=300,
            n in 0_usize..=100,
        ) {
            let field
                = Field::new(avg_n, PhotonDist::BoseEinstein, cut_n).unwrap();
            if avg_n != 0 {
                prop_assert!(field.pdf(n) > 0.0);
                prop_assert!(field.pdf(n) > field.pdf(n + 1));
                prop_assert!(
                    (field.pdf(0) - 1.0 / (1.0 + avg_n as f64)).abs() < 1e-12);
            } else {
                prop_assert_eq!(field.pdf(n), dirac(0.0, n));
            }
        }
    }

    #[test]
    fn poisson_mean_equals_variance() {
        for avg_n in [1_i64, 5, 12, 30] {
            let field = Field::new(avg_n, PhotonDist::Poisson, 150).unwrap();
            let (m0, m1, m2)
                = field.pdf_iter()
                .fold((0.0, 0.0, 0.0), |(m0, m1, m2), (n, p)| {
                    let n = n as f64;
                    (m0 + p, m1 + n * p, m2 + n * n * p)
                });
            let mean = m1 / m0;
            let var = m2 / m0 - mean * mean;
            assert_abs_diff_eq!(mean, avg_n as f64, epsilon = 1e-6);
            assert_abs_diff_eq!(var, avg_n as f64, epsilon = 1e-6);
        }
    }

    #[test]
    fn poisson_large_n() {
        // n! overflows f64 past n = 170
        let p = poisson(200.0, 200);
        assert!(p.is_finite() && p > 0.0);
        assert_abs_diff_eq!(p, 0.028197, epsilon = 1e-5);
    }

    #[test]
    fn field_raises() {
        for dist in PhotonDist::ALL.into_iter() {
            assert!(matches!(
                Field::new(-1, dist, 100), Err(Error::InvalidFieldSpec(_))));
            assert!(matches!(
                Field::new(1, dist, -1), Err(Error::InvalidFieldSpec(_))));
            assert!(matches!(
                Field::new(-100, dist, -1), Err(Error::InvalidFieldSpec(_))));
            assert!(matches!(
                Field::new(100, dist, 1), Err(Error::InvalidFieldSpec(_))));
        }
    }

    #[test]
    fn field_thr() {
        assert!(Field::new(99, PhotonDist::Dirac, 100).is_ok());
        assert!(Field::new(99, PhotonDist::Poisson, 100).is_err());
        assert!(Field::new(99, PhotonDist::BoseEinstein, 100).is_err());
    }

    #[test]
    fn tags() {
        for dist in PhotonDist::ALL.into_iter() {
            assert_eq!(dist.tag().parse::<PhotonDist>().unwrap(), dist);
        }
        assert!(matches!(
            "Gaussian".parse::<PhotonDist>(), Err(Error::InvalidFieldSpec(_))));
        let field = Field::from_tag(5, "BoseEinstein", 200).unwrap();
        assert_eq!(field.pdf_n(), PhotonDist::BoseEinstein);
        assert_eq!(field.avg_n(), 5);
        assert_eq!(field.cut_n(), 200);
    }
}
