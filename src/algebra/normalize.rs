use super::FloatT;

/// Default threshold below which coefficients are treated as zero.
pub const DEFAULT_SMALLEST_ELEMENT: f64 = 1e-20;

/// Clamps near-zero values to an exact zero.
///
/// Every coefficient, bound and right-hand side passes through a
/// `Normalizer` before it is stored, either in a staging buffer or in
/// native memory.  Changing the threshold does not revisit values that
/// have already been stored.
///
/// ```
/// use lpmodel::algebra::Normalizer;
///
/// let n = Normalizer::new(1e-6);
/// assert_eq!(n.normalize(1e-7), 0.0);
/// assert_eq!(n.normalize(-2.5), -2.5);
/// assert_eq!(n.normalize(f64::INFINITY), f64::INFINITY);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer<T = f64> {
    epsilon: T,
}

impl<T> Normalizer<T>
where
    T: FloatT,
{
    /// `Normalizer` constructor.  A negative or NaN threshold is a caller
    /// error and is rejected upstream by settings validation.
    pub fn new(epsilon: T) -> Self {
        debug_assert!(epsilon >= T::zero());
        Self { epsilon }
    }

    pub fn epsilon(&self) -> T {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: T) {
        debug_assert!(epsilon >= T::zero());
        self.epsilon = epsilon;
    }

    /// Returns `x` if `|x| >= epsilon`, otherwise zero.  NaN maps to zero.
    #[inline]
    pub fn normalize(&self, x: T) -> T {
        if x.abs() >= self.epsilon {
            x
        } else {
            T::zero()
        }
    }
}

impl Default for Normalizer<f64> {
    fn default() -> Self {
        Self::new(DEFAULT_SMALLEST_ELEMENT)
    }
}

#[test]
fn test_normalize_threshold() {
    let n = Normalizer::new(1e-3);

    assert_eq!(n.normalize(1e-3), 1e-3);
    assert_eq!(n.normalize(-1e-3), -1e-3);
    assert_eq!(n.normalize(9.99e-4), 0.);
    assert_eq!(n.normalize(-9.99e-4), 0.);
    assert_eq!(n.normalize(f64::NEG_INFINITY), f64::NEG_INFINITY);
    assert_eq!(n.normalize(f64::NAN), 0.);
}

#[test]
fn test_normalize_idempotent() {
    let n = Normalizer::new(1e-6);
    for x in [1e-9, -5e-7, 0., 3e-12] {
        let once = n.normalize(x);
        assert_eq!(once, 0.);
        assert_eq!(n.normalize(once), once);
    }
    for x in [1., -1e-6, 42.5] {
        assert_eq!(n.normalize(n.normalize(x)), x);
    }
}

#[test]
fn test_normalize_zero_epsilon_keeps_everything() {
    let n = Normalizer::<f64>::new(0.);
    assert_eq!(n.normalize(1e-300), 1e-300);
    assert_eq!(n.normalize(0.), 0.);
}
