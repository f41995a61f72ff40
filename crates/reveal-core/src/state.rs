#![forbid(unsafe_code)]

//! Visibility state and the per-sample transition policy.
//!
//! The policy is a pure function over `(current state, sample, config)` so
//! it can be exercised without any watcher or session plumbing:
//!
//! | `is_intersecting` | `trigger_once` | Result                                        |
//! |-------------------|----------------|-----------------------------------------------|
//! | true              | any            | visible, `progress = min(ratio / threshold, 1)` |
//! | true              | true           | as above, then release the registration       |
//! | false             | false          | hidden, `progress = 0`                        |
//! | false             | true           | unchanged                                     |
//!
//! A non-positive threshold treats any reported intersection as full
//! progress.

use crate::config::RevealConfig;

/// What a consumer reads to drive an entrance animation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisibilityState {
    pub is_visible: bool,
    /// Normalized progress in `[0, 1]`.
    pub progress: f64,
}

impl VisibilityState {
    /// Before any intersection has been observed.
    pub const HIDDEN: Self = Self {
        is_visible: false,
        progress: 0.0,
    };

    /// Used when the host cannot observe visibility at all, so dependent
    /// content is shown instead of staying hidden.
    pub const FALLBACK: Self = Self {
        is_visible: true,
        progress: 1.0,
    };
}

/// One notification from the platform visibility primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionSample {
    pub is_intersecting: bool,
    /// Fraction of the target inside the (margin-adjusted) root.
    pub intersection_ratio: f64,
}

impl IntersectionSample {
    /// Build a sample, clamping the ratio into `[0, 1]` (NaN becomes 0).
    #[must_use]
    pub fn new(is_intersecting: bool, intersection_ratio: f64) -> Self {
        Self {
            is_intersecting,
            intersection_ratio: sanitize_ratio(intersection_ratio),
        }
    }

    #[must_use]
    pub fn outside() -> Self {
        Self::new(false, 0.0)
    }
}

#[inline]
fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    }
}

/// Progress for an intersecting target.
#[must_use]
pub fn progress_for(ratio: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 1.0;
    }
    (sanitize_ratio(ratio) / threshold).min(1.0)
}

/// Outcome of applying one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: VisibilityState,
    /// The session should stop observing after this update.
    pub release: bool,
}

/// Apply `sample` to `current` under `config`.
#[must_use]
pub fn apply_sample(
    current: VisibilityState,
    sample: IntersectionSample,
    config: &RevealConfig,
) -> Transition {
    if sample.is_intersecting {
        return Transition {
            state: VisibilityState {
                is_visible: true,
                progress: progress_for(sample.intersection_ratio, config.threshold()),
            },
            release: config.trigger_once(),
        };
    }
    if config.trigger_once() {
        Transition {
            state: current,
            release: false,
        }
    } else {
        Transition {
            state: VisibilityState::HIDDEN,
            release: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggling(threshold: f64) -> RevealConfig {
        RevealConfig::default()
            .with_threshold(threshold)
            .unwrap()
            .with_trigger_once(false)
    }

    #[test]
    fn ratio_is_sanitized() {
        assert_eq!(IntersectionSample::new(true, f64::NAN).intersection_ratio, 0.0);
        assert_eq!(IntersectionSample::new(true, 1.7).intersection_ratio, 1.0);
        assert_eq!(IntersectionSample::new(true, -0.2).intersection_ratio, 0.0);
    }

    #[test]
    fn progress_scales_and_clamps() {
        assert!((progress_for(0.15, 0.3) - 0.5).abs() < 1e-12);
        assert_eq!(progress_for(0.3, 0.3), 1.0);
        assert_eq!(progress_for(0.9, 0.3), 1.0);
        assert_eq!(progress_for(0.0, 0.3), 0.0);
    }

    #[test]
    fn zero_threshold_means_full_progress() {
        assert_eq!(progress_for(0.0, 0.0), 1.0);
        assert_eq!(progress_for(0.01, 0.0), 1.0);
    }

    #[test]
    fn trigger_once_latches_and_requests_release() {
        let config = RevealConfig::default();
        let t = apply_sample(
            VisibilityState::HIDDEN,
            IntersectionSample::new(true, 0.15),
            &config,
        );
        assert!(t.state.is_visible);
        assert!(t.release);

        let after = apply_sample(t.state, IntersectionSample::outside(), &config);
        assert_eq!(after.state, t.state);
        assert!(!after.release);
    }

    #[test]
    fn trigger_once_ignores_leaving_before_first_entry() {
        let t = apply_sample(
            VisibilityState::HIDDEN,
            IntersectionSample::outside(),
            &RevealConfig::default(),
        );
        assert_eq!(t.state, VisibilityState::HIDDEN);
        assert!(!t.release);
    }

    #[test]
    fn toggling_mode_resets_progress_on_exit() {
        let config = toggling(0.5);
        let visible = apply_sample(
            VisibilityState::HIDDEN,
            IntersectionSample::new(true, 0.5),
            &config,
        );
        assert_eq!(
            visible.state,
            VisibilityState {
                is_visible: true,
                progress: 1.0
            }
        );
        assert!(!visible.release);

        let hidden = apply_sample(visible.state, IntersectionSample::new(false, 0.4), &config);
        assert_eq!(hidden.state, VisibilityState::HIDDEN);
    }
}
