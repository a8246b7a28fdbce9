use itertools::Itertools;
use std::fmt::Debug;

/// A totally ordered key drawn from a fixed range.
///
/// `MIN` and `MAX` bound the whole key space. They are never expected as record
/// keys but are always valid probe and boundary values.
pub trait SplitKey: Copy + Ord + Debug + Send + Sync + 'static {
    const MIN: Self;
    const MAX: Self;

    /// position of the key in the key space, used for all key arithmetic
    fn ordinal(self) -> u128;

    /// inverse of `ordinal`, callers only pass values inside `[MIN, MAX]`
    fn from_ordinal(ordinal: u128) -> Self;

    /// floor average of two keys, independent of argument order
    fn midpoint(self, other: Self) -> Self {
        let (low, high) = if self <= other {
            (self.ordinal(), other.ordinal())
        } else {
            (other.ordinal(), self.ordinal())
        };

        Self::from_ordinal(low + (high - low) / 2)
    }

    /// midpoint of the bracket, only if it lies strictly between both bounds
    fn split(self, other: Self) -> Option<Self> {
        let middle = self.midpoint(other);

        (middle != self && middle != other).then_some(middle)
    }

    /// `count` keys spread evenly over the whole key space
    ///
    /// The first key is always `MIN` and the last always `MAX`. Key spaces smaller
    /// than `count` yield fewer, deduplicated keys.
    fn spread(count: usize) -> Vec<Self> {
        if count < 2 {
            return vec![Self::MIN, Self::MAX];
        }

        let first = Self::MIN.ordinal();
        let steps = (count - 1) as u128;
        let range = Self::MAX.ordinal() - first;
        // step * range / steps, split so neither product overflows
        let (quotient, remainder) = (range / steps, range % steps);

        (0..steps)
            .map(|step| Self::from_ordinal(first + step * quotient + step * remainder / steps))
            .chain(std::iter::once(Self::MAX))
            .dedup()
            .collect()
    }
}

macro_rules! unsigned_key {
    ($($ty:ty),*) => {
        $(
            impl SplitKey for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn ordinal(self) -> u128 {
                    self as u128
                }

                #[inline]
                fn from_ordinal(ordinal: u128) -> Self {
                    ordinal as $ty
                }
            }
        )*
    };
}

unsigned_key!(u8, u16, u32, u64, u128);
