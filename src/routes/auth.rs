use crate::{
    auth::{
        can_edit, hash_password, session, verify_password, AuthenticatedUser, LoginForm,
        ProfileForm, RegisterForm, LOGIN_ERROR_MESSAGES,
    },
    error::AppError,
    messages::Messages,
    models::{NewUser, User, UserChanges},
    response::{form_errors, redirect, render},
    state::AppState,
    urls,
};
use actix_session::Session;
use actix_web::{get, post, route, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationError, ValidationErrors};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Resolves the credentials of a login form to an active user.
async fn authenticate(state: &AppState, form: &LoginForm) -> Result<Option<User>, AppError> {
    if form.validate().is_err() {
        return Ok(None);
    }
    let user = match state.users.find_user_by_username(&form.username).await? {
        Some(user) => user,
        None => return Ok(None),
    };
    if !user.is_active || !verify_password(&form.password, &user.password_hash) {
        return Ok(None);
    }
    Ok(Some(user))
}

fn username_taken() -> ValidationError {
    let mut error = ValidationError::new("unique");
    error.message = Some(USERNAME_TAKEN.into());
    error
}

/// Adds the username error when another account already uses `username`.
async fn check_username_free(
    state: &AppState,
    username: &str,
    own_id: Option<i32>,
    errors: &mut ValidationErrors,
) -> Result<(), AppError> {
    if let Some(existing) = state.users.find_user_by_username(username).await? {
        if Some(existing.id) != own_id {
            errors.add("username", username_taken());
        }
    }
    Ok(())
}

/// Login form.
#[get("/login/")]
pub async fn login_page(messages: Messages, query: web::Query<NextQuery>) -> HttpResponse {
    render(
        "authapp:login",
        &messages,
        json!({ "form": { "username": "" }, "next": query.into_inner().next }),
    )
}

/// Logs a user in.
///
/// ## Responses:
/// - `302 Found`: Credentials accepted. Redirects to `next` when it is a local path,
///   otherwise to the main page.
/// - `200 OK`: Credentials rejected. The form is rendered again with the submitted
///   username and one warning per login error message.
#[post("/login/")]
pub async fn login(
    state: web::Data<AppState>,
    session: Session,
    messages: Messages,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    match authenticate(&state, &form).await? {
        Some(user) => {
            session::login(&session, &user)?;
            log::info!("User '{}' logged in", user.username);
            messages.info(format!("Login success!<br>Hi, {}", user.display_name()))?;
            let target = urls::safe_next(form.next.as_deref()).unwrap_or_else(urls::main_page);
            Ok(redirect(target))
        }
        None => {
            log::warn!("Failed login attempt for username '{}'", form.username);
            for msg in LOGIN_ERROR_MESSAGES {
                messages.warning(format!("Something goes wrong:<br>{}", msg))?;
            }
            Ok(render(
                "authapp:login",
                &messages,
                json!({ "form": { "username": form.username }, "next": form.next }),
            ))
        }
    }
}

/// Logs the user out. The farewell message is queued before the session user is
/// dropped so it is shown on the next page.
#[route("/logout/", method = "GET", method = "POST")]
pub async fn logout(session: Session, messages: Messages) -> Result<HttpResponse, AppError> {
    messages.info("See you later!")?;
    session::logout(&session);
    Ok(redirect(urls::main_page()))
}

#[get("/register/")]
pub async fn register_page(messages: Messages) -> HttpResponse {
    render("authapp:register", &messages, json!({ "form": {}, "errors": {} }))
}

/// The registration form rendered again with errors. Passwords are not echoed.
fn register_form_page(
    messages: &Messages,
    form: &RegisterForm,
    errors: &ValidationErrors,
) -> HttpResponse {
    render(
        "authapp:register",
        messages,
        json!({
            "form": {
                "username": form.username,
                "email": form.email,
                "first_name": form.first_name,
                "last_name": form.last_name,
                "age": form.age,
            },
            "errors": form_errors(errors),
        }),
    )
}

/// Creates an account.
///
/// ## Responses:
/// - `302 Found`: Account created, redirects to the main page.
/// - `200 OK`: The form is rendered again with field errors. Passwords are not echoed.
#[post("/register/")]
pub async fn register(
    state: web::Data<AppState>,
    messages: Messages,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let (age, mut errors) = match form.clean() {
        Ok(age) => (age, ValidationErrors::new()),
        Err(errors) => (None, errors),
    };
    check_username_free(&state, &form.username, None, &mut errors).await?;

    if !errors.is_empty() {
        return Ok(register_form_page(&messages, &form, &errors));
    }

    let password_hash = hash_password(&form.password1)?;
    let created = state
        .users
        .create_user(NewUser {
            username: form.username.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            age,
            password_hash,
            is_staff: false,
        })
        .await;

    match created {
        Ok(user) => {
            log::info!("Registered user '{}' ({})", user.username, user.id);
            Ok(redirect(urls::main_page()))
        }
        // Taken between the check above and the insert.
        Err(AppError::Conflict(msg)) => {
            log::info!("Registration raced on username: {}", msg);
            errors.add("username", username_taken());
            Ok(register_form_page(&messages, &form, &errors))
        }
        Err(e) => Err(e),
    }
}

/// Loads the profile `pk` after checking the requester owns it.
async fn owned_profile(state: &AppState, requester: &User, pk: i32) -> Result<User, AppError> {
    if !can_edit(requester.id, pk) {
        return Err(AppError::Forbidden(format!(
            "User {} may not edit profile {}",
            requester.id, pk
        )));
    }
    state
        .users
        .find_user(pk)
        .await?
        .ok_or_else(|| AppError::not_found("User", pk))
}

#[get("/profile_edit/{pk}/")]
pub async fn profile_edit_page(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    messages: Messages,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let profile = owned_profile(&state, &user.0, path.into_inner()).await?;
    Ok(render(
        "authapp:profile_edit",
        &messages,
        json!({ "object": profile, "errors": {} }),
    ))
}

/// Saves the requester's own profile.
///
/// ## Responses:
/// - `302 Found`: Saved, redirects back to the profile page. Anonymous visitors are
///   redirected to the login page instead.
/// - `200 OK`: The form is rendered again with field errors.
/// - `403 Forbidden`: The profile belongs to another user.
#[post("/profile_edit/{pk}/")]
pub async fn profile_edit(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    messages: Messages,
    path: web::Path<i32>,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, AppError> {
    let profile = owned_profile(&state, &user.0, path.into_inner()).await?;
    let form = form.into_inner();

    let (age, mut errors) = match form.clean() {
        Ok(age) => (age, ValidationErrors::new()),
        Err(errors) => (None, errors),
    };
    check_username_free(&state, &form.username, Some(profile.id), &mut errors).await?;

    if errors.is_empty() {
        let changes = UserChanges {
            username: form.username.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            age,
        };
        match state.users.update_user(profile.id, changes).await {
            Ok(updated) => return Ok(redirect(urls::profile_edit(updated.id))),
            Err(AppError::Conflict(msg)) => {
                log::info!("Profile edit raced on username: {}", msg);
                errors.add("username", username_taken());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(render(
        "authapp:profile_edit",
        &messages,
        json!({ "object": profile, "form": form, "errors": form_errors(&errors) }),
    ))
}
