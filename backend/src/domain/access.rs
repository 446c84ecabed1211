//! Authorization guards.
//!
//! Guards are explicit functions composed in front of every mutating or
//! viewing operation, parameterised by the resolved acting user. A violation
//! is always a typed failure, never a silent no-op.

use crate::domain::error::Error;
use crate::domain::user::{User, UserId};

/// Reject blocked accounts at every entry point.
pub fn require_active(actor: &User) -> Result<(), Error> {
    if actor.is_blocked {
        return Err(Error::forbidden("account is blocked"));
    }
    Ok(())
}

/// The acting user must own the resource or carry the admin flag.
pub fn require_owner_or_admin(actor: &User, owner: &UserId) -> Result<(), Error> {
    require_active(actor)?;
    if actor.id == *owner || actor.is_admin {
        return Ok(());
    }
    Err(Error::forbidden("not the owner of this resource"))
}

/// The acting user must carry the admin flag.
pub fn require_admin(actor: &User) -> Result<(), Error> {
    require_active(actor)?;
    if actor.is_admin {
        return Ok(());
    }
    Err(Error::forbidden("administrator access required"))
}

/// Admin-scoped destructive actions must not target the acting admin
/// themselves, nor any other admin account. Self-protection and
/// peer-protection are separate checks, both enforced.
pub fn require_admin_target_modifiable(actor: &User, target: &User) -> Result<(), Error> {
    require_admin(actor)?;
    if actor.id == target.id {
        return Err(Error::forbidden("admins cannot act on their own account"));
    }
    if target.is_admin {
        return Err(Error::forbidden("admin accounts cannot be modified here"));
    }
    Ok(())
}
