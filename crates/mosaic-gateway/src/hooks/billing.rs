//! Billing guard.

use mosaic_core::ResourceId;
use tracing::info;

use crate::error::{GatewayError, GatewayResult};

/// Veto the call when billing is disabled.
pub(crate) fn guard(resource: &ResourceId, disable_billing: bool) -> GatewayResult<()> {
    if disable_billing {
        info!(resource = %resource, "Billing disabled, call vetoed");
        return Err(GatewayError::Vetoed {
            resource: resource.to_string(),
            reason: "billing is disabled".to_string(),
        });
    }
    Ok(())
}
