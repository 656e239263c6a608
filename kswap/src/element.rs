//! Numeric element types a block buffer can hold.
//!
//! Shared by the merge operators (arithmetic) and the protocol codec
//! (little-endian wire encoding).

/// A numeric element carried through a swap reduction.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Human-readable name, used in error messages.
    const NAME: &'static str;

    /// Encoded size in bytes.
    const SIZE: usize;

    /// Whether [`Element::over`] is meaningful for this type.
    const BLENDABLE: bool;

    /// `a + b`. Integers wrap instead of overflowing.
    fn accumulate(a: Self, b: Self) -> Self;

    /// Premultiplied "over" for one channel: `front + back * (1 - front_alpha)`.
    ///
    /// Returns `None` for types without a unit interval (integers).
    fn over(front: Self, back: Self, front_alpha: Self) -> Option<Self>;

    /// Read a value from exactly `SIZE` little-endian bytes (alignment-safe).
    fn read_le(bytes: &[u8]) -> Self;

    /// Write the value as `SIZE` little-endian bytes.
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! impl_element {
    (int: $($ty:ty),*) => {
        $(
            impl Element for $ty {
                const NAME: &'static str = stringify!($ty);
                const SIZE: usize = std::mem::size_of::<$ty>();
                const BLENDABLE: bool = false;

                #[inline]
                fn accumulate(a: Self, b: Self) -> Self {
                    a.wrapping_add(b)
                }

                #[inline]
                fn over(_front: Self, _back: Self, _front_alpha: Self) -> Option<Self> {
                    None
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn write_le(self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
    (float: $($ty:ty),*) => {
        $(
            impl Element for $ty {
                const NAME: &'static str = stringify!($ty);
                const SIZE: usize = std::mem::size_of::<$ty>();
                const BLENDABLE: bool = true;

                #[inline]
                fn accumulate(a: Self, b: Self) -> Self {
                    a + b
                }

                #[inline]
                fn over(front: Self, back: Self, front_alpha: Self) -> Option<Self> {
                    Some(front + back * (1.0 - front_alpha))
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn write_le(self, bytes: &mut [u8]) {
                    bytes.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element!(int: i32, i64, u32, u64);
impl_element!(float: f32, f64);
