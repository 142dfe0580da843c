use num_traits::{Float, NumAssign};
use std::fmt::{Debug, Display};

/// Core trait for floating point values stored in model buffers.
///
/// `FloatT` relies on [`num_traits`](num_traits) for its constituent trait
/// bounds.  Native engine memory is always `f64`, but the value normalizer
/// and the staging buffers only need the bounds below.
pub trait FloatT: 'static + Float + NumAssign + Default + Display + Debug + Sized {}

impl<T> FloatT for T where T: 'static + Float + NumAssign + Default + Display + Debug + Sized {}
