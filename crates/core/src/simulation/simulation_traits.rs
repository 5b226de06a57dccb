use async_trait::async_trait;

use super::simulation_model::{WhatIfRequest, WhatIfResult};
use crate::errors::Result;

/// Projects a hypothetical trade over the current ledger without writing anything.
#[async_trait]
pub trait SimulationServiceTrait: Send + Sync {
    async fn simulate(&self, user_id: &str, request: WhatIfRequest) -> Result<WhatIfResult>;
}
