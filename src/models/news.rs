use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A news item. Deleting one only sets `deleted`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct News {
    pub id: i32,
    pub title: String,
    /// Short summary shown in the list.
    pub preambule: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

/// Form posted by the create and update pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewsForm {
    /// Must be between 1 and 256 characters.
    #[serde(default)]
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// At most 1024 characters.
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub preambule: String,
    #[serde(default)]
    pub body: String,
}

impl From<&News> for NewsForm {
    fn from(news: &News) -> Self {
        Self {
            title: news.title.clone(),
            preambule: news.preambule.clone(),
            body: news.body.clone(),
        }
    }
}
