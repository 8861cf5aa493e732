// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

/// Renders a [`Duration`] for humans, e.g. `1 hours, 2 minutes and 3.450 seconds`.
///
/// Leading zero components are dropped, so short durations read as `4.000 seconds`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use respite::HumanDuration;
///
/// assert_eq!(HumanDuration(Duration::from_millis(90_250)).to_string(), "1 minutes and 30.250 seconds");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl Display for HumanDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total_secs = self.0.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        let millis = self.0.subsec_millis();

        if hours > 0 {
            write!(f, "{hours} hours, {minutes} minutes and {seconds}.{millis:03} seconds")
        } else if minutes > 0 {
            write!(f, "{minutes} minutes and {seconds}.{millis:03} seconds")
        } else {
            write!(f, "{seconds}.{millis:03} seconds")
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, "0.000 seconds")]
    #[case(4_000, "4.000 seconds")]
    #[case(59_999, "59.999 seconds")]
    #[case(60_000, "1 minutes and 0.000 seconds")]
    #[case(3_600_000, "1 hours, 0 minutes and 0.000 seconds")]
    #[case(3_723_045, "1 hours, 2 minutes and 3.045 seconds")]
    #[case(90_000_000, "25 hours, 0 minutes and 0.000 seconds")]
    fn renders(#[case] millis: u64, #[case] expected: &str) {
        assert_eq!(HumanDuration(Duration::from_millis(millis)).to_string(), expected);
    }
}
