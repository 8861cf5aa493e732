// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

use tick::Clock;

/// The moment the first attempt of a logical request was issued.
///
/// The marker is attached to the request once, before the first attempt, and left untouched by
/// retries. Elapsed-time compensation reads it to discount the time already spent by failed
/// attempts from the planned wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestStart(SystemTime);

impl RequestStart {
    /// Captures the current time of `clock`.
    #[must_use]
    pub fn now(clock: &Clock) -> Self {
        Self(clock.system_time())
    }

    /// Creates a marker for an explicit point in time.
    #[must_use]
    pub fn at(time: SystemTime) -> Self {
        Self(time)
    }

    /// Returns the captured time.
    #[must_use]
    pub fn time(&self) -> SystemTime {
        self.0
    }

    /// Returns the time elapsed since the marker according to `clock`.
    ///
    /// A marker in the future yields [`Duration::ZERO`].
    #[must_use]
    pub fn elapsed(&self, clock: &Clock) -> Duration {
        clock.system_time().duration_since(self.0).unwrap_or(Duration::ZERO)
    }
}

impl From<SystemTime> for RequestStart {
    fn from(time: SystemTime) -> Self {
        Self(time)
    }
}

/// A per-request context that can carry a [`RequestStart`] marker.
///
/// Implement this for whatever request type the transport dispatches. With the `http` feature
/// it is implemented for [`http::Request`] and [`http::Extensions`], storing the marker as a
/// typed extension.
///
/// # Examples
///
/// ```
/// use respite::{RequestContext, RequestStart};
/// use tick::Clock;
///
/// #[derive(Clone, Default)]
/// struct Call {
///     start: Option<RequestStart>,
/// }
///
/// impl RequestContext for Call {
///     fn request_start(&self) -> Option<RequestStart> {
///         self.start
///     }
///
///     fn set_request_start(&mut self, start: RequestStart) {
///         self.start = Some(start);
///     }
/// }
///
/// let clock = Clock::new_frozen();
/// let mut call = Call::default();
/// let first = call.stamp_request_start(&clock);
/// assert_eq!(call.stamp_request_start(&clock), first);
/// ```
pub trait RequestContext {
    /// Returns the marker, if one has been attached.
    fn request_start(&self) -> Option<RequestStart>;

    /// Attaches or replaces the marker.
    fn set_request_start(&mut self, start: RequestStart);

    /// Attaches the current time of `clock` unless a marker is already present, and returns
    /// the marker in effect.
    fn stamp_request_start(&mut self, clock: &Clock) -> RequestStart {
        if let Some(start) = self.request_start() {
            return start;
        }

        let start = RequestStart::now(clock);
        self.set_request_start(start);
        start
    }
}

#[cfg(any(feature = "http", test))]
impl RequestContext for http::Extensions {
    fn request_start(&self) -> Option<RequestStart> {
        self.get::<RequestStart>().copied()
    }

    fn set_request_start(&mut self, start: RequestStart) {
        self.insert(start);
    }
}

#[cfg(any(feature = "http", test))]
impl<B> RequestContext for http::Request<B> {
    fn request_start(&self) -> Option<RequestStart> {
        self.extensions().request_start()
    }

    fn set_request_start(&mut self, start: RequestStart) {
        self.extensions_mut().set_request_start(start);
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use tick::ClockControl;

    use super::*;

    #[test]
    fn elapsed_tracks_clock() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let start = RequestStart::now(&clock);

        control.advance(Duration::from_secs(7));

        assert_eq!(start.elapsed(&clock), Duration::from_secs(7));
        assert_eq!(start.time(), clock.system_time() - Duration::from_secs(7));
    }

    #[test]
    fn future_start_counts_as_zero_elapsed() {
        let clock = Clock::new_frozen();
        let start = RequestStart::at(clock.system_time() + Duration::from_secs(5));

        assert_eq!(start.elapsed(&clock), Duration::ZERO);
    }

    #[test]
    fn stamp_sets_marker_once() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut request = http::Request::new(());

        assert_eq!(request.request_start(), None);
        let first = request.stamp_request_start(&clock);

        control.advance(Duration::from_secs(1));
        let second = request.stamp_request_start(&clock);

        assert_eq!(first, second);
        assert_eq!(request.extensions().get::<RequestStart>(), Some(&first));
    }

    #[test]
    fn set_replaces_marker() {
        let mut extensions = http::Extensions::new();
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(42);

        extensions.set_request_start(RequestStart::at(SystemTime::UNIX_EPOCH));
        extensions.set_request_start(time.into());

        assert_eq!(extensions.request_start(), Some(RequestStart::at(time)));
    }
}
