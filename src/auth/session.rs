//! Session bookkeeping for the logged-in user.

use actix_session::Session;

use crate::error::AppError;
use crate::models::User;

pub(crate) const USER_ID_KEY: &str = "_auth_user_id";

/// Establishes `user` as the session's authenticated user.
pub fn login(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    session.insert(USER_ID_KEY, user.id)?;
    Ok(())
}

/// Forgets the authenticated user. Other session data (queued messages) is kept.
pub fn logout(session: &Session) {
    session.remove(USER_ID_KEY);
}

pub fn current_user_id(session: &Session) -> Result<Option<i32>, AppError> {
    Ok(session.get::<i32>(USER_ID_KEY)?)
}
