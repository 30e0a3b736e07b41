use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub cost: f64,
    /// Cover image file name.
    pub cover: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: i32,
    pub course_id: i32,
    /// Position of the lesson inside its course.
    pub num: i32,
    pub title: String,
    pub description: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseTeacher {
    pub id: i32,
    pub name_first: String,
    pub name_second: String,
    pub day_birth: NaiveDate,
    pub deleted: bool,
}

/// A student's review of a course. Lists of these are cached as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourseFeedback {
    pub id: i32,
    pub course_id: i32,
    pub user_id: i32,
    pub feedback: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

/// Form posted from the course page.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseFeedbackForm {
    #[serde(rename = "course", default)]
    pub course_id: i32,
    #[serde(default)]
    #[validate(length(min = 1, max = 2000))]
    pub feedback: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
}
