//! Typed access to raw native memory blocks.
//!
//! Engine vectors live in untyped byte blocks, the way a C solving library
//! hands out `double*` / `int*` buffers.  All byte-offset arithmetic is
//! confined to [`NativeScalar`] and the two view types below; every other
//! module indexes elements, never bytes.

use std::marker::PhantomData;

/// Scalar types that can be stored in a [`NativeBlock`].
pub trait NativeScalar: Copy + Default + PartialEq + std::fmt::Debug {
    /// size in bytes of one element
    const SIZE: usize;

    /// decode one element from exactly `SIZE` bytes
    fn read(bytes: &[u8]) -> Self;

    /// encode one element into exactly `SIZE` bytes
    fn write(self, bytes: &mut [u8]);
}

macro_rules! impl_native_scalar {
    ($t:ty) => {
        impl NativeScalar for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_ne_bytes(raw)
            }

            #[inline]
            fn write(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_ne_bytes());
            }
        }
    };
}

impl_native_scalar!(f64);
impl_native_scalar!(i32);

/// An untyped, resizable block of native memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeBlock {
    bytes: Vec<u8>,
}

impl NativeBlock {
    /// A zero-filled block holding `len` elements of type `T`.
    pub fn zeroed<T: NativeScalar>(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len * T::SIZE],
        }
    }

    /// A block holding a copy of `values`.
    pub fn from_slice<T: NativeScalar>(values: &[T]) -> Self {
        let mut block = Self::zeroed::<T>(values.len());
        block.view_mut::<T>().copy_from_slice(values);
        block
    }

    /// A block of `len` elements, each set to `value`.
    pub fn filled<T: NativeScalar>(len: usize, value: T) -> Self {
        let mut block = Self::zeroed::<T>(len);
        block.view_mut::<T>().fill(value);
        block
    }

    /// size of the block in bytes
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Typed read-only view over the whole block.
    pub fn view<T: NativeScalar>(&self) -> VectorView<'_, T> {
        VectorView::new(self)
    }

    /// Typed mutable view over the whole block.
    pub fn view_mut<T: NativeScalar>(&mut self) -> VectorViewMut<'_, T> {
        VectorViewMut::new(self)
    }

    /// Grow or shrink to `len` elements of type `T`, filling new slots
    /// with `value`.  The block may move in memory.
    pub fn resize<T: NativeScalar>(&mut self, len: usize, value: T) {
        let old = self.bytes.len() / T::SIZE;
        self.bytes.resize(len * T::SIZE, 0u8);
        if len > old {
            let mut view = self.view_mut::<T>();
            for i in old..len {
                view.set(i, value);
            }
        }
    }

    /// Copy out the first `len` elements.
    pub fn to_vec<T: NativeScalar>(&self, len: usize) -> Vec<T> {
        let view = self.view::<T>();
        (0..len).map(|i| view.get(i)).collect()
    }
}

/// Bounds-checked read-only typed view over a [`NativeBlock`].
#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a, T> {
    block: &'a NativeBlock,
    len: usize,
    phantom: PhantomData<T>,
}

impl<'a, T> VectorView<'a, T>
where
    T: NativeScalar,
{
    pub fn new(block: &'a NativeBlock) -> Self {
        Self {
            block,
            len: block.bytes.len() / T::SIZE,
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Panics
    /// Panics if `i` is out of bounds.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        assert!(
            i < self.len,
            "native index out of bounds: the len is {} but the index is {}",
            self.len,
            i
        );
        T::read(&self.block.bytes[i * T::SIZE..(i + 1) * T::SIZE])
    }

    pub fn try_get(&self, i: usize) -> Option<T> {
        (i < self.len).then(|| self.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

/// Bounds-checked mutable typed view over a [`NativeBlock`].
#[derive(Debug)]
pub struct VectorViewMut<'a, T> {
    block: &'a mut NativeBlock,
    len: usize,
    phantom: PhantomData<T>,
}

impl<'a, T> VectorViewMut<'a, T>
where
    T: NativeScalar,
{
    pub fn new(block: &'a mut NativeBlock) -> Self {
        let len = block.bytes.len() / T::SIZE;
        Self {
            block,
            len,
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Panics
    /// Panics if `i` is out of bounds.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.as_view().get(i)
    }

    /// # Panics
    /// Panics if `i` is out of bounds.
    #[inline]
    pub fn set(&mut self, i: usize, value: T) {
        assert!(
            i < self.len,
            "native index out of bounds: the len is {} but the index is {}",
            self.len,
            i
        );
        value.write(&mut self.block.bytes[i * T::SIZE..(i + 1) * T::SIZE]);
    }

    /// Apply `f` to every element in place.
    pub fn update(&mut self, mut f: impl FnMut(T) -> T) {
        for i in 0..self.len {
            let v = self.get(i);
            self.set(i, f(v));
        }
    }

    pub fn fill(&mut self, value: T) {
        for i in 0..self.len {
            self.set(i, value);
        }
    }

    /// # Panics
    /// Panics if `values` is longer than the view.
    pub fn copy_from_slice(&mut self, values: &[T]) {
        assert!(values.len() <= self.len);
        for (i, &v) in values.iter().enumerate() {
            self.set(i, v);
        }
    }

    pub fn as_view(&self) -> VectorView<'_, T> {
        VectorView {
            block: &*self.block,
            len: self.len,
            phantom: PhantomData,
        }
    }
}

#[test]
fn test_native_block_roundtrip() {
    let mut block = NativeBlock::from_slice(&[1.5f64, -2., f64::INFINITY]);
    assert_eq!(block.byte_len(), 24);

    let view = block.view::<f64>();
    assert_eq!(view.len(), 3);
    assert_eq!(view.get(0), 1.5);
    assert_eq!(view.get(2), f64::INFINITY);
    assert!(view.try_get(3).is_none());

    block.view_mut::<f64>().set(1, 7.);
    assert_eq!(block.to_vec::<f64>(3), vec![1.5, 7., f64::INFINITY]);
}

#[test]
fn test_native_block_resize_fills() {
    let mut block = NativeBlock::from_slice(&[3i32, 4]);
    block.resize::<i32>(4, -1);
    assert_eq!(block.to_vec::<i32>(4), vec![3, 4, -1, -1]);
    block.resize::<i32>(1, 0);
    assert_eq!(block.view::<i32>().len(), 1);
}

#[test]
#[should_panic]
fn test_native_view_out_of_bounds() {
    let mut block = NativeBlock::zeroed::<f64>(2);
    block.view_mut::<f64>().set(2, 1.);
}
