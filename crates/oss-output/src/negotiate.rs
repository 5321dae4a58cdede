//! Per-axis negotiation against a live sink.
//!
//! [`resolve`] consults the cache first and only probes the device for values it has no
//! verdict on. When the device rejects a value, the nearest supported convertible value is
//! tried next. Every failed probe demotes its value, and fallback candidates are drawn from
//! the (shrinking) supported set, so the search always terminates.

use crate::param_cache::{Axis, ParamCache, Support};
use crate::sink::PcmSink;

/// Outcome of [`resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// The value to play with.
    pub value: u32,
    /// Whether the sink was configured with `value` during the search.
    pub probed: bool,
}

/// Find a value for `axis` the device accepts, starting from `desired`.
///
/// Returns `None` when the device rejects `desired` and no convertible fallback remains.
pub fn resolve<S>(cache: &mut ParamCache, sink: &mut S, axis: Axis, desired: u32) -> Option<Resolved>
where
    S: PcmSink + ?Sized,
{
    let mut candidate = match cache.classify(axis, desired) {
        Support::Supported => {
            return Some(Resolved {
                value: desired,
                probed: false,
            });
        }
        Support::Unknown => desired,
        Support::Unsupported => cache.nearest_convertible(axis, desired)?,
    };

    loop {
        match sink.set_param(axis, candidate) {
            Ok(actual) => {
                cache.promote(axis, candidate);
                if actual != candidate {
                    tracing::debug!(%axis, requested = candidate, actual, "device adjusted value");
                }
                return Some(Resolved {
                    value: actual,
                    probed: true,
                });
            }
            Err(err) => {
                tracing::debug!(%axis, value = candidate, error = %err, "device rejected value");
                cache.demote(axis, candidate);
                candidate = cache.nearest_convertible(axis, desired)?;
            }
        }
    }
}

/// Negotiate `axis` and make sure the sink is actually configured with the result.
///
/// A cache hit from [`resolve`] skips probing, but a freshly opened handle still has to be
/// told the value. If the device now refuses a value it accepted before, the value is
/// demoted and negotiation resumes from the fallback candidates.
pub fn settle<S>(cache: &mut ParamCache, sink: &mut S, axis: Axis, desired: u32) -> Option<u32>
where
    S: PcmSink + ?Sized,
{
    loop {
        let resolved = resolve(cache, sink, axis, desired)?;
        if resolved.probed {
            return Some(resolved.value);
        }
        match sink.set_param(axis, resolved.value) {
            Ok(actual) => return Some(actual),
            Err(err) => {
                tracing::debug!(%axis, value = resolved.value, error = %err, "known value refused");
                cache.demote(axis, resolved.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkDriver;
    use crate::testing::FakeDriver;

    fn open(driver: &FakeDriver) -> crate::testing::FakeSink {
        driver.open("/dev/fake").unwrap()
    }

    #[test]
    fn supported_value_is_returned_without_probing() {
        let driver = FakeDriver::supporting(&[44_100], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        let resolved = resolve(&mut cache, &mut sink, Axis::Rate, 48_000).unwrap();
        assert_eq!(
            resolved,
            Resolved {
                value: 48_000,
                probed: false
            }
        );
        assert!(driver.state().probes.is_empty());
    }

    #[test]
    fn unknown_value_is_probed_and_promoted() {
        let driver = FakeDriver::supporting(&[96_000], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        let resolved = resolve(&mut cache, &mut sink, Axis::Rate, 96_000).unwrap();
        assert_eq!(resolved.value, 96_000);
        assert!(resolved.probed);
        assert_eq!(cache.classify(Axis::Rate, 96_000), Support::Supported);
        assert_eq!(driver.state().probes, vec![(Axis::Rate, 96_000)]);

        // Second negotiation is a cache hit.
        let again = resolve(&mut cache, &mut sink, Axis::Rate, 96_000).unwrap();
        assert!(!again.probed);
        assert_eq!(driver.state().probes.len(), 1);
    }

    #[test]
    fn rejected_value_falls_back_to_nearest_supported() {
        let driver = FakeDriver::supporting(&[44_100, 48_000], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        let resolved = resolve(&mut cache, &mut sink, Axis::Rate, 47_000).unwrap();
        assert_eq!(resolved.value, 48_000);
        assert_eq!(cache.classify(Axis::Rate, 47_000), Support::Unsupported);
        assert_eq!(
            driver.state().probes,
            vec![(Axis::Rate, 47_000), (Axis::Rate, 48_000)]
        );
    }

    #[test]
    fn known_unsupported_value_is_not_probed_again() {
        let driver = FakeDriver::supporting(&[44_100, 48_000], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();
        cache.demote(Axis::Rate, 96_000);

        let resolved = resolve(&mut cache, &mut sink, Axis::Rate, 96_000).unwrap();
        assert_eq!(resolved.value, 48_000);
        assert_eq!(driver.state().probes, vec![(Axis::Rate, 48_000)]);
    }

    #[test]
    fn stale_supported_entries_are_demoted_until_one_works() {
        // The cache believes 48000 and 44100 work, the device only takes 44100.
        let driver = FakeDriver::supporting(&[44_100], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        let resolved = resolve(&mut cache, &mut sink, Axis::Rate, 50_000).unwrap();
        assert_eq!(resolved.value, 44_100);
        assert_eq!(cache.classify(Axis::Rate, 48_000), Support::Unsupported);
        assert_eq!(
            driver.state().probes,
            vec![(Axis::Rate, 50_000), (Axis::Rate, 48_000), (Axis::Rate, 44_100)]
        );
    }

    #[test]
    fn exhausted_candidates_fail_and_terminate() {
        let driver = FakeDriver::supporting(&[], &[], &[]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        assert_eq!(resolve(&mut cache, &mut sink, Axis::Rate, 22_050), None);
        assert_eq!(cache.supported(Axis::Rate).count(), 0);
        // desired plus each seeded rate, once.
        assert_eq!(driver.state().probes.len(), 3);
    }

    #[test]
    fn channel_fallback_ignores_non_convertible_values() {
        let driver = FakeDriver::supporting(&[44_100], &[1, 2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();
        cache.promote(Axis::Channels, 1);

        let resolved = resolve(&mut cache, &mut sink, Axis::Channels, 4).unwrap();
        assert_eq!(resolved.value, 2);
    }

    #[test]
    fn adjusted_value_is_reported_but_request_is_cached() {
        let driver = FakeDriver::supporting(&[44_100], &[2], &[16]);
        driver.state().rate_adjust = Some(44_117);
        let mut sink = open(&driver);
        let mut cache = ParamCache::empty();

        let resolved = resolve(&mut cache, &mut sink, Axis::Rate, 44_100).unwrap();
        assert_eq!(resolved.value, 44_117);
        assert_eq!(cache.classify(Axis::Rate, 44_100), Support::Supported);
    }

    #[test]
    fn settle_applies_cached_value_to_the_handle() {
        let driver = FakeDriver::supporting(&[44_100, 48_000], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        assert_eq!(settle(&mut cache, &mut sink, Axis::Rate, 48_000), Some(48_000));
        assert_eq!(driver.state().probes, vec![(Axis::Rate, 48_000)]);
    }

    #[test]
    fn settle_recovers_when_cached_value_is_refused() {
        let driver = FakeDriver::supporting(&[44_100], &[2], &[16]);
        let mut sink = open(&driver);
        let mut cache = ParamCache::new();

        assert_eq!(settle(&mut cache, &mut sink, Axis::Rate, 48_000), Some(44_100));
        assert_eq!(cache.classify(Axis::Rate, 48_000), Support::Unsupported);
        assert_eq!(
            driver.state().probes,
            vec![(Axis::Rate, 48_000), (Axis::Rate, 44_100)]
        );
    }
}
