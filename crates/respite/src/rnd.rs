// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Where jitter draws its random fraction from.
///
/// The fast source is `fastrand` and is **NOT cryptographically secure**. Jitter only spreads
/// the retries of concurrent requests apart.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) enum Rnd {
    #[default]
    Fast,

    /// Always yields the given fraction.
    #[cfg(test)]
    Fixed(f64),
}

impl Rnd {
    /// Returns the share of the jitter bound to apply. The fast source yields values in `[0, 1)`.
    pub fn fraction(self) -> f64 {
        match self {
            Self::Fast => fastrand::f64(),
            #[cfg(test)]
            Self::Fixed(fraction) => fraction,
        }
    }
}
