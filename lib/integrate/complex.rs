//! Integration of complex-valued systems on top of the real solver.
//!
//! A complex vector of length *k* is carried through the solver as a real
//! vector of length 2*k* holding interleaved real and imaginary parts:
//! ```text
//! [z0, z1, ...] <-> [Re z0, Im z0, Re z1, Im z1, ...]
//! ```
//! The user derivative is wrapped to speak this encoding, and the solution is
//! decoded back afterward.

use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use super::{ odeint, OdeOptions, OdeResult, Solution, SolverOpt };

/// Encode a complex vector as interleaved real and imaginary parts.
pub fn encode<S>(z: &nd::ArrayBase<S, nd::Ix1>) -> nd::Array1<f64>
where S: nd::Data<Elem = C64>
{
    z.iter().flat_map(|a| [a.re, a.im]).collect()
}

/// Decode interleaved real and imaginary parts into a complex vector.
///
/// *Panics* if `x` has odd length.
pub fn decode<S>(x: &nd::ArrayBase<S, nd::Ix1>) -> nd::Array1<C64>
where S: nd::Data<Elem = f64>
{
    assert!(x.len() % 2 == 0, "decode: odd-length real buffer");
    x.iter().tuples().map(|(re, im)| C64::new(*re, *im)).collect()
}

/// Decode a real solution array, with time along the last axis, into the
/// corresponding complex array.
///
/// *Panics* if the first axis has odd length.
pub fn decode_traj<S>(y: &nd::ArrayBase<S, nd::Ix2>) -> nd::Array2<C64>
where S: nd::Data<Elem = f64>
{
    let (m, nt) = y.dim();
    assert!(m % 2 == 0, "decode_traj: odd-length real axis");
    nd::Array2::from_shape_fn(
        (m / 2, nt),
        |(i, k)| C64::new(y[[2 * i, k]], y[[2 * i + 1, k]]),
    )
}

/// Numerically integrate the complex system `dz/dt = f(z, t)` from `z0` at
/// `t[0]`, reporting the solution at every element of `t`.
///
/// Extra parameters of the system should be captured by `f`. The returned
/// array has shape `(z0.len(), t.len())` and its first column is `z0`
/// exactly.
///
/// Fails with [`OdeError::UnsupportedSolverOption`][super::OdeError] if `opts`
/// asks for a Jacobian, a column-major derivative, a banded Jacobian, or full
/// diagnostic output; otherwise fails as [`odeint`] does.
pub fn odeintz<F>(
    f: F,
    z0: &nd::Array1<C64>,
    t: &nd::Array1<f64>,
    opts: &[SolverOpt<'_>],
) -> OdeResult<Solution<C64>>
where F: Fn(&nd::Array1<C64>, f64) -> nd::Array1<C64>
{
    let options = OdeOptions::from_opts(opts)?;
    odeintz_with(f, z0, t, &options)
}

/// Like [`odeintz`], but with already-resolved solver settings.
pub fn odeintz_with<F>(
    f: F,
    z0: &nd::Array1<C64>,
    t: &nd::Array1<f64>,
    options: &OdeOptions,
) -> OdeResult<Solution<C64>>
where F: Fn(&nd::Array1<C64>, f64) -> nd::Array1<C64>
{
    let realfunc = |x: &nd::Array1<f64>, tk: f64| encode(&f(&decode(x), tk));
    let x0 = encode(z0);
    let Solution { y, stats } = odeint(realfunc, &x0, t, options)?;
    Ok(Solution { y: decode_traj(&y), stats })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::rc::Rc;
    use approx::assert_abs_diff_eq;
    use crate::integrate::{ JacobianFn, OdeError };

    #[test]
    fn interleaved_layout() {
        let z = nd::array![C64::new(1.0, 2.0), C64::new(-3.0, 0.5)];
        let x = encode(&z);
        assert_eq!(x, nd::array![1.0, 2.0, -3.0, 0.5]);
        assert_eq!(decode(&x), z);
    }

    #[test]
    fn trajectory_layout() {
        let y = nd::array![
            [1.0, 2.0, 3.0],
            [0.0, -1.0, -2.0],
            [5.0, 6.0, 7.0],
            [0.5, 0.25, 0.125],
        ];
        let z = decode_traj(&y);
        assert_eq!(z.dim(), (2, 3));
        assert_eq!(z[[0, 1]], C64::new(2.0, -1.0));
        assert_eq!(z[[1, 2]], C64::new(7.0, 0.125));
    }

    #[test]
    fn phase_rotation() {
        // dz/dt = -i w z  =>  z(t) = z0 exp(-i w t)
        let w = 2.5;
        let t: nd::Array1<f64> = nd::Array1::linspace(0.0, 10.0, 101);
        let z0 = nd::array![C64::new(0.6, 0.0), C64::new(0.0, 0.8)];
        let sol = odeintz(|z, _| z * (-C64::i() * w), &z0, &t, &[]).unwrap();
        for (k, &tk) in t.iter().enumerate() {
            let phase = (-C64::i() * w * tk).exp();
            for j in 0..2 {
                let expected = z0[j] * phase;
                assert_abs_diff_eq!(sol.y[[j, k]].re, expected.re, epsilon = 1e-6);
                assert_abs_diff_eq!(sol.y[[j, k]].im, expected.im, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn first_point_is_exact() {
        let t = nd::array![0.0, 0.01, 0.02];
        let z0 = nd::array![
            C64::new(0.1234567890123, -0.3),
            C64::new(1.0 / 3.0, 2.0_f64.sqrt()),
        ];
        let sol
            = odeintz(|z, t| z * C64::new(t, -1.0), &z0, &t, &[]).unwrap();
        assert_eq!(sol.y.column(0), z0);
    }

    #[test]
    fn rejects_unsupported_options() {
        let t = nd::array![0.0, 1.0];
        let z0 = nd::array![C64::new(1.0, 0.0)];
        let jac: JacobianFn
            = Rc::new(|y: &nd::Array1<f64>, _: f64| nd::Array2::eye(y.len()));
        let res = odeintz(|z, _| z.clone(), &z0, &t, &[SolverOpt::Jacobian(jac)]);
        assert!(matches!(res, Err(OdeError::UnsupportedSolverOption("jacobian"))));
        let res = odeintz(|z, _| z.clone(), &z0, &t, &[SolverOpt::FullOutput]);
        assert!(matches!(res, Err(OdeError::UnsupportedSolverOption(_))));
    }
}
