use tracing::info;

use swordgate_core::deposit::{AuthContext, Deposit};
use swordgate_core::error::SwordError;
use swordgate_core::policy::DepositPolicy;
use swordgate_core::store::{ContainerId, IngestResult, RepositoryStore};

use crate::archiver::OriginalsArchiver;
use crate::gate::check_acceptable;

/// Runs a deposit through the acceptability gate and, when the policy
/// requests it, archives the original copy on `target`.
///
/// A deposit rejected by the gate never reaches storage. Failure dumping
/// stays a caller decision: on a [`SwordError::Storage`] the caller may
/// hand the deposit to [`crate::dumper`] before failing the request.
///
/// # Errors
///
/// Propagates the gate's rejection or the archiver's storage failure;
/// no partial success is reported once either is raised.
pub async fn ingest<P: DepositPolicy, S: RepositoryStore>(
    policy: &P,
    store: &S,
    target: &ContainerId,
    deposit: &Deposit,
    auth: &AuthContext,
    result: &mut IngestResult<S::Payload>,
) -> Result<(), SwordError> {
    info!(
        username = %auth.username(),
        on_behalf_of = auth.on_behalf_of().unwrap_or("NONE"),
        target = %target,
        "Processing deposit request"
    );

    check_acceptable(policy, deposit, target)?;
    OriginalsArchiver::new(policy, store)
        .store_originals(target, deposit, result)
        .await
}
