//! Numeric building blocks shared by the engine and the model layer.
//!
//! Provides the [`FloatT`] bound, the coefficient [`Normalizer`] and the typed
//! views over raw native memory ([`NativeBlock`], [`VectorView`],
//! [`VectorViewMut`]).

mod floats;
pub use floats::*;
mod normalize;
pub use normalize::*;
mod memory;
pub use memory::*;
