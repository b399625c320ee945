//! Hook implementations.
//!
//! A hook runs in up to two phases around the transport call: `before`
//! may rewrite or veto the outgoing call, `after` may rewrite the
//! response, mirror it into host state, or chain a follow-up call.

mod billing;
mod directory;
mod identity;
mod legacy;
mod whitelabel;

pub use whitelabel::WhitelabelState;

use std::sync::Arc;

use mosaic_core::{AuthSession, ResourceId, SessionStore};
use mosaic_events::EventBus;

use crate::error::GatewayResult;
use crate::hook::HookKind;
use crate::intent::RequestIntent;
use crate::progress::{ProgressTicket, UploadProgressTracker};
use crate::settings::GatewaySettings;
use crate::transport::ApiResponse;

/// Host state hooks read and update.
pub(crate) struct HookEnv<'a> {
    pub(crate) settings: &'a GatewaySettings,
    pub(crate) session: &'a AuthSession,
    pub(crate) session_store: &'a dyn SessionStore,
    pub(crate) bus: &'a EventBus,
    pub(crate) whitelabel: &'a WhitelabelState,
    pub(crate) tracker: &'a Arc<UploadProgressTracker>,
}

/// Result of the `after` phase.
pub(crate) enum AfterOutcome {
    /// Hand this response to the caller.
    Done(ApiResponse),
    /// The caller's outcome is the outcome of this call.
    FollowUp(RequestIntent),
}

/// Run the `before` phase.
///
/// Returns the progress ticket for tracked uploads; the caller holds it
/// until the transport resolves.
pub(crate) fn before(
    kind: HookKind,
    resource: &ResourceId,
    intent: &mut RequestIntent,
    env: &HookEnv<'_>,
) -> GatewayResult<Option<ProgressTicket>> {
    match kind {
        HookKind::BillingGuard => billing::guard(resource, env.settings.disable_billing)?,
        HookKind::E911Write => {
            if let Some(body) = intent.body_mut() {
                legacy::migrate_request(body);
            }
        },
        HookKind::UploadProgress if intent.upload_progress.is_none() => {
            let ticket = env.tracker.begin();
            intent.upload_progress = Some(ticket.callback());
            return Ok(Some(ticket));
        },
        _ => {},
    }
    Ok(None)
}

/// Run the `after` phase on a successful response.
pub(crate) fn after(
    kind: HookKind,
    request: &RequestIntent,
    mut response: ApiResponse,
    env: &HookEnv<'_>,
) -> AfterOutcome {
    match kind {
        HookKind::AccountSync => {
            identity::sync_account(request, &response.data, env.session, env.bus);
        },
        HookKind::SortUsers => directory::sort_users(&mut response.data),
        HookKind::ConferenceNumbers => {
            let fallback = env.session.current_account_id();
            if let Some(follow_up) =
                directory::migrate_conference_numbers(request, &mut response.data, fallback)
            {
                return AfterOutcome::FollowUp(follow_up);
            }
        },
        HookKind::CurrentUserSync => identity::sync_current_user(
            request,
            &response.data,
            env.session,
            env.session_store,
            env.bus,
        ),
        HookKind::E911Read => legacy::migrate_response(&mut response.data),
        HookKind::WhitelabelSync => whitelabel::sync(
            &response.data,
            env.settings.domain.as_deref(),
            env.whitelabel,
            env.bus,
        ),
        HookKind::Passthrough
        | HookKind::BillingGuard
        | HookKind::E911Write
        | HookKind::UploadProgress => {},
    }
    AfterOutcome::Done(response)
}
