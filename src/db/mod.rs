//! Storage for accounts and portal content.
//!
//! Handlers and background jobs only see the `UserRepository` and
//! `ContentRepository` traits. `PgStore` keeps everything in PostgreSQL,
//! `MemoryStore` keeps it in process memory for development and tests.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    Course, CourseFeedback, CourseFeedbackForm, CourseTeacher, Lesson, News, NewsForm, NewUser,
    User, UserChanges,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Account storage. Users are created and edited but never removed.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Returns `AppError::Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Returns `AppError::NotFound` when no user has this id and
    /// `AppError::Conflict` when another user has the new username.
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, AppError>;
}

/// News and course storage.
///
/// `find_*` lookups by primary key return soft-deleted rows too, list queries skip them.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Newest first.
    async fn list_news(&self, limit: i64, offset: i64) -> Result<Vec<News>, AppError>;

    async fn count_news(&self) -> Result<i64, AppError>;

    async fn find_news(&self, id: i32) -> Result<Option<News>, AppError>;

    async fn create_news(&self, form: &NewsForm) -> Result<News, AppError>;

    async fn update_news(&self, id: i32, form: &NewsForm) -> Result<News, AppError>;

    /// Sets the `deleted` flag; the row stays in place.
    async fn soft_delete_news(&self, id: i32) -> Result<(), AppError>;

    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;

    async fn find_course(&self, id: i32) -> Result<Option<Course>, AppError>;

    /// Ordered by lesson number.
    async fn lessons_for_course(&self, course_id: i32) -> Result<Vec<Lesson>, AppError>;

    async fn teachers_for_course(&self, course_id: i32) -> Result<Vec<CourseTeacher>, AppError>;

    /// The `limit` most recent feedbacks of a course.
    async fn feedback_for_course(
        &self,
        course_id: i32,
        limit: i64,
    ) -> Result<Vec<CourseFeedback>, AppError>;

    async fn create_feedback(
        &self,
        user_id: i32,
        form: &CourseFeedbackForm,
    ) -> Result<CourseFeedback, AppError>;
}
