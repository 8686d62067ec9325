use cometpay::GatewayConfig;

/// Shared application state for the notification server.
pub struct AppState {
    /// Gateway settings. Credentials are selected from here per request,
    /// so a sandbox/production toggle applies to notifications that arrive
    /// after the change.
    pub config: GatewayConfig,
    /// Bearer token for the /metrics endpoint. `None` keeps metrics closed.
    pub metrics_token: Option<Vec<u8>>,
}
