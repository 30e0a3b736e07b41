//! PostgreSQL storage backend.
//!
//! Expects the tables `users`, `news`, `courses`, `lessons`, `course_teachers`,
//! `course_teachers_courses (teacher_id, course_id)` and `course_feedback`,
//! with columns named after the model fields.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ContentRepository, UserRepository};
use crate::error::AppError;
use crate::models::{
    Course, CourseFeedback, CourseFeedbackForm, CourseTeacher, Lesson, News, NewsForm, NewUser,
    User, UserChanges,
};

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, age, password_hash, \
                            is_staff, is_active, date_joined";
const NEWS_COLUMNS: &str = "id, title, preambule, body, created_at, updated_at, deleted";
const COURSE_COLUMNS: &str =
    "id, name, description, cost, cover, created_at, updated_at, deleted";
const FEEDBACK_COLUMNS: &str = "id, course_id, user_id, feedback, rating, created_at, deleted";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, first_name, last_name, email, age, password_hash, \
             is_staff, is_active, date_joined)
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, NOW())
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.username)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(user.age)
        .bind(user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, AppError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET username = $1, first_name = $2, last_name = $3, email = $4, age = $5
             WHERE id = $6
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(changes.username)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.age)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        updated.ok_or_else(|| AppError::not_found("User", id))
    }
}

#[async_trait]
impl ContentRepository for PgStore {
    async fn list_news(&self, limit: i64, offset: i64) -> Result<Vec<News>, AppError> {
        let news = sqlx::query_as::<_, News>(&format!(
            "SELECT {} FROM news WHERE deleted = FALSE
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2",
            NEWS_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(news)
    }

    async fn count_news(&self) -> Result<i64, AppError> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM news WHERE deleted = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_news(&self, id: i32) -> Result<Option<News>, AppError> {
        let news = sqlx::query_as::<_, News>(&format!(
            "SELECT {} FROM news WHERE id = $1",
            NEWS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(news)
    }

    async fn create_news(&self, form: &NewsForm) -> Result<News, AppError> {
        let news = sqlx::query_as::<_, News>(&format!(
            "INSERT INTO news (title, preambule, body, created_at, updated_at, deleted)
             VALUES ($1, $2, $3, NOW(), NOW(), FALSE)
             RETURNING {}",
            NEWS_COLUMNS
        ))
        .bind(&form.title)
        .bind(&form.preambule)
        .bind(&form.body)
        .fetch_one(&self.pool)
        .await?;
        Ok(news)
    }

    async fn update_news(&self, id: i32, form: &NewsForm) -> Result<News, AppError> {
        let news = sqlx::query_as::<_, News>(&format!(
            "UPDATE news SET title = $1, preambule = $2, body = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {}",
            NEWS_COLUMNS
        ))
        .bind(&form.title)
        .bind(&form.preambule)
        .bind(&form.body)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        news.ok_or_else(|| AppError::not_found("News", id))
    }

    async fn soft_delete_news(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE news SET deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("News", id));
        }
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE deleted = FALSE ORDER BY id",
            COURSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn find_course(&self, id: i32) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn lessons_for_course(&self, course_id: i32) -> Result<Vec<Lesson>, AppError> {
        let lessons = sqlx::query_as::<_, Lesson>(
            "SELECT id, course_id, num, title, description, deleted FROM lessons
             WHERE course_id = $1 AND deleted = FALSE
             ORDER BY num",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lessons)
    }

    async fn teachers_for_course(&self, course_id: i32) -> Result<Vec<CourseTeacher>, AppError> {
        let teachers = sqlx::query_as::<_, CourseTeacher>(
            "SELECT t.id, t.name_first, t.name_second, t.day_birth, t.deleted
             FROM course_teachers t
             JOIN course_teachers_courses tc ON tc.teacher_id = t.id
             WHERE tc.course_id = $1 AND t.deleted = FALSE
             ORDER BY t.id",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teachers)
    }

    async fn feedback_for_course(
        &self,
        course_id: i32,
        limit: i64,
    ) -> Result<Vec<CourseFeedback>, AppError> {
        let feedback = sqlx::query_as::<_, CourseFeedback>(&format!(
            "SELECT {} FROM course_feedback
             WHERE course_id = $1 AND deleted = FALSE
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
            FEEDBACK_COLUMNS
        ))
        .bind(course_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(feedback)
    }

    async fn create_feedback(
        &self,
        user_id: i32,
        form: &CourseFeedbackForm,
    ) -> Result<CourseFeedback, AppError> {
        if self.find_course(form.course_id).await?.map_or(true, |c| c.deleted) {
            return Err(AppError::not_found("Course", form.course_id));
        }
        let feedback = sqlx::query_as::<_, CourseFeedback>(&format!(
            "INSERT INTO course_feedback (course_id, user_id, feedback, rating, created_at, deleted)
             VALUES ($1, $2, $3, $4, NOW(), FALSE)
             RETURNING {}",
            FEEDBACK_COLUMNS
        ))
        .bind(form.course_id)
        .bind(user_id)
        .bind(&form.feedback)
        .bind(form.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(feedback)
    }
}
