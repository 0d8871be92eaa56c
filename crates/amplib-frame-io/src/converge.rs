//! Converge-by-toggle state control.
//!
//! Many amplifier settings can only be stepped ("next antenna", "next power
//! level"), never set directly. [`converge`] drives such a setting to a
//! target by alternating fresh observations with single toggles, bounded by
//! a per-operation toggle budget:
//!
//! 1. observe the current value
//! 2. if it equals the target, stop
//! 3. if the budget is spent, fail with [`Error::Convergence`]
//! 4. otherwise toggle once and go back to 1
//!
//! A budget of `N` therefore means at most `N` toggles and `N + 1`
//! observations.

use std::fmt;

use amplib_core::error::{Error, Result};
use async_trait::async_trait;

/// Parameters of one converging setter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergeRequest<T> {
    /// Setter name, reported in [`Error::Convergence`].
    pub operation: &'static str,
    pub desired: T,
    pub max_toggles: u32,
}

impl<T> ConvergeRequest<T> {
    pub fn new(operation: &'static str, desired: T, max_toggles: u32) -> Self {
        ConvergeRequest {
            operation,
            desired,
            max_toggles,
        }
    }
}

/// The device side of a convergence loop.
#[async_trait]
pub trait ToggleControl<T: Send + Sync>: Send {
    /// Read the current value, bypassing any cache.
    async fn observe(&mut self) -> Result<T>;

    /// Step the device once. `observed` is the value just read, for
    /// controls whose step direction depends on it.
    async fn advance(&mut self, observed: &T, desired: &T) -> Result<()>;
}

/// Drive `control` until it reports `request.desired`.
///
/// Returns the number of toggles issued. Observation and toggle errors end
/// the loop immediately and are returned unchanged.
pub async fn converge<T, C>(control: &mut C, request: &ConvergeRequest<T>) -> Result<u32>
where
    T: PartialEq + fmt::Display + Send + Sync,
    C: ToggleControl<T> + ?Sized,
{
    let mut toggles = 0u32;
    loop {
        let observed = control.observe().await?;
        if observed == request.desired {
            tracing::debug!(
                operation = request.operation,
                desired = %request.desired,
                toggles,
                "Converged"
            );
            return Ok(toggles);
        }
        if toggles >= request.max_toggles {
            tracing::warn!(
                operation = request.operation,
                desired = %request.desired,
                observed = %observed,
                toggles,
                "Toggle budget exhausted"
            );
            return Err(Error::Convergence {
                operation: request.operation,
                desired: request.desired.to_string(),
                observed: observed.to_string(),
                toggles,
            });
        }
        tracing::debug!(
            operation = request.operation,
            observed = %observed,
            desired = %request.desired,
            toggle = toggles + 1,
            "Toggling"
        );
        control.advance(&observed, &request.desired).await?;
        toggles += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A device whose value cycles through `0..states` on each toggle, with
    /// some values that can never be reached.
    struct CyclicDevice {
        value: u8,
        states: u8,
        skipped: Vec<u8>,
        observations: u32,
        toggles: u32,
        fail_observe_after: Option<u32>,
    }

    impl CyclicDevice {
        fn new(value: u8, states: u8) -> Self {
            CyclicDevice {
                value,
                states,
                skipped: Vec::new(),
                observations: 0,
                toggles: 0,
                fail_observe_after: None,
            }
        }
    }

    #[async_trait]
    impl ToggleControl<u8> for CyclicDevice {
        async fn observe(&mut self) -> Result<u8> {
            if self.fail_observe_after == Some(self.observations) {
                return Err(Error::Timeout);
            }
            self.observations += 1;
            Ok(self.value)
        }

        async fn advance(&mut self, _observed: &u8, _desired: &u8) -> Result<()> {
            self.toggles += 1;
            loop {
                self.value = (self.value + 1) % self.states;
                if !self.skipped.contains(&self.value) {
                    return Ok(());
                }
            }
        }
    }

    #[tokio::test]
    async fn already_at_target_issues_no_toggle() {
        let mut device = CyclicDevice::new(2, 4);
        let toggles = converge(&mut device, &ConvergeRequest::new("set_x", 2, 4))
            .await
            .unwrap();
        assert_eq!(toggles, 0);
        assert_eq!(device.observations, 1);
    }

    #[tokio::test]
    async fn reachable_target_converges_within_distance() {
        for start in 0..4u8 {
            for target in 0..4u8 {
                let mut device = CyclicDevice::new(start, 4);
                let toggles = converge(&mut device, &ConvergeRequest::new("set_x", target, 4))
                    .await
                    .unwrap();
                let distance = u32::from((target + 4 - start) % 4);
                assert_eq!(toggles, distance, "{start} -> {target}");
                assert_eq!(device.toggles, distance);
                assert_eq!(device.observations, distance + 1);
            }
        }
    }

    #[tokio::test]
    async fn unreachable_target_fails_after_exact_budget() {
        let mut device = CyclicDevice::new(0, 4);
        device.skipped = vec![3];

        let err = converge(&mut device, &ConvergeRequest::new("set_antenna", 3, 4))
            .await
            .unwrap_err();

        assert_eq!(device.toggles, 4);
        assert_eq!(device.observations, 5);
        match err {
            Error::Convergence {
                operation,
                desired,
                observed,
                toggles,
            } => {
                assert_eq!(operation, "set_antenna");
                assert_eq!(desired, "3");
                // 0 -> 1 -> 2 -> 0 -> 1
                assert_eq!(observed, "1");
                assert_eq!(toggles, 4);
            }
            other => panic!("expected Convergence, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_budget_only_observes() {
        let mut device = CyclicDevice::new(0, 2);
        let err = converge(&mut device, &ConvergeRequest::new("set_x", 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Convergence { toggles: 0, .. }));
        assert_eq!(device.toggles, 0);
    }

    #[tokio::test]
    async fn observation_error_propagates() {
        let mut device = CyclicDevice::new(0, 4);
        device.fail_observe_after = Some(2);
        let err = converge(&mut device, &ConvergeRequest::new("set_x", 3, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(device.toggles, 2);
    }
}
