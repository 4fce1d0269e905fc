// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys understood by the controllers
pub mod annotations {
    /// When set to "true", the CA bundle is injected into the object
    pub const INJECT_CABUNDLE: &str = "service.alpha.openshift.io/inject-cabundle";
}

/// Data key holding the injected CA bundle
pub const INJECTION_DATA_KEY: &str = "service-ca.crt";

/// The operator name used as field manager for writes
pub const OPERATOR_NAME: &str = "service-ca-operator";

/// Operator condition types and reasons
pub mod conditions {
    pub const AVAILABLE: &str = "Available";
    pub const PROGRESSING: &str = "Progressing";
    pub const FAILING: &str = "Failing";

    pub const REASON_NOT_READY: &str = "ManagedDeploymentsNotReady";
    pub const REASON_GET_FAILED: &str = "ManagedDeploymentGetFailed";
    pub const REASON_COMPLETE: &str = "ManagedDeploymentsCompleteAndUpdated";
    pub const REASON_AVAILABLE_UPDATED: &str = "ManagedDeploymentsAvailableAndUpdated";
    pub const REASON_AVAILABLE: &str = "ManagedDeploymentsAvailable";
    pub const REASON_AS_EXPECTED: &str = "AsExpected";
}

/// Per-item retry backoff for the work queue
pub mod backoff {
    /// Delay after the first failure, in milliseconds
    pub const BASE_DELAY_MS: u64 = 5;
    /// Upper bound for a single retry delay, in seconds
    pub const MAX_DELAY_SECS: u64 = 1000;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
