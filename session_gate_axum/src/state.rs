use std::sync::Arc;

use session_gate::Gateway;

use crate::config::{GateConfig, GateConfigError};

/// Shared state of the gate middleware and the authentication routes
#[derive(Debug, Clone)]
pub struct GateState {
    pub gateway: Arc<Gateway>,
    pub config: Arc<GateConfig>,
}

impl GateState {
    pub fn new(gateway: Arc<Gateway>, config: GateConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
        }
    }

    /// State with routing rules read from the environment
    pub fn from_env(gateway: Arc<Gateway>) -> Result<Self, GateConfigError> {
        Ok(Self::new(gateway, GateConfig::from_env()?))
    }
}
