use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use super::session::current_user_id;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// The logged-in, active user of the request.
///
/// Anonymous visitors are answered with `AppError::LoginRequired`, a redirect to
/// the login page that brings them back to the requested path. Use
/// `Option<AuthenticatedUser>` on pages that anonymous visitors may see.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// An authenticated user with the staff flag. Other users get `403 Forbidden`.
#[derive(Debug, Clone)]
pub struct StaffUser(pub User);

fn load_user(req: &HttpRequest) -> LocalBoxFuture<'static, Result<User, AppError>> {
    let session = req.get_session();
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let next = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string());

    Box::pin(async move {
        let state = state.ok_or_else(|| {
            AppError::InternalServerError("AppState is not registered".to_string())
        })?;
        let user = match current_user_id(&session)? {
            Some(id) => state.users.find_user(id).await?,
            None => None,
        };
        match user {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::LoginRequired(next)),
        }
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = load_user(req);
        Box::pin(async move { Ok(AuthenticatedUser(user.await?)) })
    }
}

impl FromRequest for StaffUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = load_user(req);
        Box::pin(async move {
            let user = user.await?;
            if !user.is_staff {
                return Err(AppError::Forbidden(format!(
                    "User '{}' is not a staff member",
                    user.username
                ))
                .into());
            }
            Ok(StaffUser(user))
        })
    }
}
