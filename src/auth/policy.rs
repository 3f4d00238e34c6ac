//! Per-operation authorization rules, evaluated by handlers once the auth
//! gate has attached an [`Identity`].

use crate::{
    announcements::repo_types::Announcement,
    auth::{claims::Identity, error::AuthError},
};

/// Only the owner may edit an announcement.
pub fn ensure_can_update(caller: &Identity, announcement: &Announcement) -> Result<(), AuthError> {
    if announcement.owner_id != caller.user_id {
        return Err(AuthError::OwnershipViolation);
    }
    Ok(())
}

/// Admins are barred from deleting announcements.
pub fn ensure_can_delete(caller: &Identity) -> Result<(), AuthError> {
    deny_admin(caller)
}

/// Admins are barred from moving announcements through the lifecycle.
pub fn ensure_can_change_status(caller: &Identity) -> Result<(), AuthError> {
    deny_admin(caller)
}

/// Flagging a user is an admin action.
pub fn ensure_can_flag_user(caller: &Identity) -> Result<(), AuthError> {
    if !caller.is_admin {
        return Err(AuthError::AdminRestricted);
    }
    Ok(())
}

fn deny_admin(caller: &Identity) -> Result<(), AuthError> {
    if caller.is_admin {
        return Err(AuthError::AdminRestricted);
    }
    Ok(())
}
