use crate::{
    auth::AuthenticatedUser,
    cache::mail_feedback_lock_key,
    error::AppError,
    jobs::{enqueue_feedback_mail, FeedbackMessage},
    messages::Messages,
    response::{form_errors, redirect, render},
    state::AppState,
    urls,
};
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 1000))]
    pub message: String,
}

#[get("/")]
pub async fn main_page(messages: Messages) -> HttpResponse {
    render("mainapp:main_page", &messages, json!({}))
}

#[get("/contacts/")]
pub async fn contacts_page(
    user: Option<AuthenticatedUser>,
    messages: Messages,
) -> HttpResponse {
    render(
        "mainapp:contacts",
        &messages,
        json!({ "form": ContactForm::default(), "errors": {}, "can_write": user.is_some() }),
    )
}

/// Queues a message to technical support.
///
/// A user may write once per lock period. While the lock is held the message is
/// refused with a warning and nothing is queued. The lock is released again when
/// the message cannot be queued.
///
/// ## Responses:
/// - `302 Found`: Back to the contacts page, queued or refused. Anonymous
///   visitors are redirected to the login page instead.
/// - `200 OK`: Empty or overlong message, the form is rendered again.
#[post("/contacts/")]
pub async fn contacts(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    messages: Messages,
    form: web::Form<ContactForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    if let Err(errors) = form.validate() {
        return Ok(render(
            "mainapp:contacts",
            &messages,
            json!({ "form": form, "errors": form_errors(&errors), "can_write": true }),
        ));
    }

    let user_id = user.0.id;
    let lock_key = mail_feedback_lock_key(user_id);
    let acquired = state
        .cache
        .set_if_absent(
            &lock_key,
            serde_json::to_vec(&true)?,
            Some(state.settings.feedback_mail_lock),
        )
        .await?;
    if !acquired {
        let minutes = (state.settings.feedback_mail_lock.as_secs() + 59) / 60;
        messages.warning(format!(
            "You can send only one message per {} minutes",
            minutes
        ))?;
        return Ok(redirect(urls::contacts()));
    }

    let queued = enqueue_feedback_mail(
        state.queue.as_ref(),
        &FeedbackMessage {
            user_id,
            message: form.message,
        },
    )
    .await;
    let job_id = match queued {
        Ok(job_id) => job_id,
        Err(e) => {
            // Nothing was sent, so the user may try again right away.
            if let Err(release) = state.cache.delete(&lock_key).await {
                log::warn!("Failed to release {}: {}", lock_key, release);
            }
            return Err(e);
        }
    };
    log::info!("Feedback mail of user {} queued as job {}", user_id, job_id);

    messages.info("Message sended")?;
    Ok(redirect(urls::contacts()))
}
