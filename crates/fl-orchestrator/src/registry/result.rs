//! Aggregate outcome of a fleet-wide call

use fl_core::HostId;

/// Fleet outcome, folded from per-host results as tasks finish
///
/// Starts successful; any failure makes it fail for good.
#[derive(Debug)]
pub struct FleetResult {
    ok: bool,
    failed: Vec<HostId>,
}

impl FleetResult {
    pub fn new() -> Self {
        Self {
            ok: true,
            failed: Vec::new(),
        }
    }

    /// Fold in one host's outcome
    pub fn record(&mut self, host: &HostId, ok: bool) {
        if !ok {
            self.ok = false;
            self.failed.push(host.clone());
        }
    }

    /// Fail without a host to blame (a task panicked, or there was nothing to do)
    pub fn fail(&mut self) {
        self.ok = false;
    }

    pub fn succeeded(&self) -> bool {
        self.ok
    }

    /// Hosts that reported failure, in completion order
    pub fn failed_hosts(&self) -> &[HostId] {
        &self.failed
    }
}

impl Default for FleetResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(outcomes: &[(&str, bool)]) -> FleetResult {
        let mut result = FleetResult::new();
        for (host, ok) in outcomes {
            result.record(&HostId::from(*host), *ok);
        }
        result
    }

    #[test]
    fn test_starts_successful() {
        assert!(FleetResult::new().succeeded());
        assert!(FleetResult::default().succeeded());
    }

    #[test]
    fn test_all_success() {
        assert!(fold(&[("a", true), ("b", true), ("c", true)]).succeeded());
    }

    #[test]
    fn test_any_failure_in_any_order() {
        let outcomes = [("a", true), ("b", false), ("c", true)];
        for rotation in 0..outcomes.len() {
            let mut order = outcomes.to_vec();
            order.rotate_left(rotation);
            let result = fold(&order);
            assert!(!result.succeeded());
            assert_eq!(result.failed_hosts(), &[HostId::from("b")]);
        }
    }

    #[test]
    fn test_failure_is_sticky() {
        let result = fold(&[("a", false), ("b", true), ("c", true)]);
        assert!(!result.succeeded());
    }

    #[test]
    fn test_unattributed_failure() {
        let mut result = fold(&[("a", true)]);
        result.fail();
        assert!(!result.succeeded());
        assert!(result.failed_hosts().is_empty());
    }
}
