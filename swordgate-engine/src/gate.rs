use tracing::error;

use swordgate_core::deposit::Deposit;
use swordgate_core::error::SwordError;
use swordgate_core::policy::DepositPolicy;
use swordgate_core::store::ContainerId;

/// Checks whether `deposit` is acceptable for `target` under `policy`.
///
/// Two independent veto conditions, evaluated in order: the declared
/// content type first, then the packaging identifier. The first failure
/// short-circuits. Both failure paths log before returning the typed
/// rejection; success has no side effect.
///
/// # Errors
///
/// Returns [`SwordError::UnacceptableContentType`] or
/// [`SwordError::UnacceptablePackaging`], each carrying the offending
/// value and the target identity.
pub fn check_acceptable(
    policy: &impl DepositPolicy,
    deposit: &Deposit,
    target: &ContainerId,
) -> Result<(), SwordError> {
    if !policy.is_acceptable_content_type(deposit.mime_type(), target) {
        error!(
            mime_type = %deposit.mime_type(),
            target = %target,
            "Unacceptable content type detected"
        );
        return Err(SwordError::UnacceptableContentType {
            mime_type: deposit.mime_type().to_string(),
            target: target.to_string(),
        });
    }

    if !policy.is_accepted_packaging(deposit.packaging(), target) {
        error!(
            packaging = %deposit.packaging(),
            target = %target,
            "Unacceptable packaging type detected"
        );
        return Err(SwordError::UnacceptablePackaging {
            packaging: deposit.packaging().to_string(),
            target: target.to_string(),
        });
    }

    Ok(())
}
