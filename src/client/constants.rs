//! Constants used throughout the client application

/// URL scheme of the northbound endpoint.
pub const ENDPOINT_SCHEME: &str = "tcp";

/// The environment server is reached through a local port-forward.
pub const ENDPOINT_HOST: &str = "localhost";

/// Session name reserved for connectivity testing.
pub const TEST_SESSION_NAME: &str = "test";

/// Key under which the policy is injected into the action template.
pub const ACTION_LIST_KEY: &str = "action_list";
