use serde::{Deserialize, Serialize};

use super::JobQueue;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::mail::{Email, Mailer};

pub const SEND_FEEDBACK_MAIL: &str = "send_feedback_mail";
pub const FEEDBACK_SUBJECT: &str = "TechSupport Help";
pub const SUPPORT_ADDRESS: &str = "techsupport@braniac.com";

/// Queue payload of the feedback mail job: `{"user_id": 7, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub user_id: i32,
    pub message: String,
}

/// Relays a user's message to the support mailbox, sent from the user's own address.
///
/// An unknown user or a transport failure is returned as an error so the
/// queue's retry policy decides what happens next.
pub async fn send_feedback_mail(
    users: &dyn UserRepository,
    mailer: &dyn Mailer,
    form: &FeedbackMessage,
) -> Result<(), AppError> {
    log::info!("Send message: '{:?}'", form);
    let user = users
        .find_user(form.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", form.user_id))?;

    let email = Email::new(
        user.email,
        vec![SUPPORT_ADDRESS.to_string()],
        FEEDBACK_SUBJECT,
        form.message.clone(),
    );
    mailer.send(&email).await
}

pub async fn enqueue_feedback_mail(
    queue: &dyn JobQueue,
    form: &FeedbackMessage,
) -> Result<String, AppError> {
    queue
        .enqueue(SEND_FEEDBACK_MAIL, serde_json::to_value(form)?)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::mail::MemoryMailer;
    use crate::models::NewUser;

    async fn store_with_users(count: i32) -> MemoryStore {
        let store = MemoryStore::new();
        for n in 1..=count {
            store
                .create_user(NewUser {
                    username: format!("user{}", n),
                    first_name: String::new(),
                    last_name: String::new(),
                    email: format!("u{}@example.com", n),
                    age: None,
                    password_hash: "hash".to_string(),
                    is_staff: false,
                })
                .await
                .unwrap();
        }
        store
    }

    #[actix_rt::test]
    async fn test_mail_send() {
        let store = store_with_users(7).await;
        let mailer = MemoryMailer::new();
        let form: FeedbackMessage =
            serde_json::from_value(serde_json::json!({"user_id": 7, "message": "test_message_text"}))
                .unwrap();

        send_feedback_mail(&store, &mailer, &form).await.unwrap();

        let outbox = mailer.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].body, "test_message_text");
        assert_eq!(outbox[0].from, "u7@example.com");
        assert_eq!(outbox[0].to, vec!["techsupport@braniac.com".to_string()]);
        assert_eq!(outbox[0].subject, "TechSupport Help");
    }

    #[actix_rt::test]
    async fn test_unknown_user_is_not_found() {
        let store = store_with_users(1).await;
        let mailer = MemoryMailer::new();
        let form = FeedbackMessage {
            user_id: 42,
            message: "hello".to_string(),
        };

        let result = send_feedback_mail(&store, &mailer, &form).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(mailer.outbox().await.is_empty());
    }

    #[test]
    fn test_payload_shape() {
        let form = FeedbackMessage {
            user_id: 7,
            message: "hi".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            serde_json::json!({"user_id": 7, "message": "hi"})
        );
    }
}
