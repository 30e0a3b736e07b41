//! In-process storage backend.
//!
//! Used when no `DATABASE_URL` is configured and by the test suite.
//! Content that has no create page (courses, lessons, teachers) is added
//! through the `add_*` methods.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use super::{ContentRepository, UserRepository};
use crate::error::AppError;
use crate::models::{
    Course, CourseFeedback, CourseFeedbackForm, CourseTeacher, Lesson, News, NewsForm, NewUser,
    User, UserChanges,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    news: Vec<News>,
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
    teachers: Vec<CourseTeacher>,
    /// (teacher_id, course_id)
    teacher_courses: Vec<(i32, i32)>,
    feedback: Vec<CourseFeedback>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

/// Storage backend holding every table in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_course(&self, name: &str, description: &str, cost: f64) -> Course {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let course = Course {
            id: tables.next_id(),
            name: name.to_string(),
            description: description.to_string(),
            cost,
            cover: "no_image.svg".to_string(),
            created_at: now,
            updated_at: now,
            deleted: false,
        };
        tables.courses.push(course.clone());
        course
    }

    pub async fn add_lesson(&self, course_id: i32, num: i32, title: &str) -> Lesson {
        let mut tables = self.tables.write().await;
        let lesson = Lesson {
            id: tables.next_id(),
            course_id,
            num,
            title: title.to_string(),
            description: String::new(),
            deleted: false,
        };
        tables.lessons.push(lesson.clone());
        lesson
    }

    pub async fn add_teacher(
        &self,
        name_first: &str,
        name_second: &str,
        day_birth: NaiveDate,
        course_ids: &[i32],
    ) -> CourseTeacher {
        let mut tables = self.tables.write().await;
        let teacher = CourseTeacher {
            id: tables.next_id(),
            name_first: name_first.to_string(),
            name_second: name_second.to_string(),
            day_birth,
            deleted: false,
        };
        for course_id in course_ids {
            tables.teacher_courses.push((teacher.id, *course_id));
        }
        tables.teachers.push(teacher.clone());
        teacher
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|user| user.username == new_user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already taken",
                new_user.username
            )));
        }
        let user = User {
            id: tables.next_id(),
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            age: new_user.age,
            password_hash: new_user.password_hash,
            is_staff: new_user.is_staff,
            is_active: true,
            date_joined: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|user| user.id != id && user.username == changes.username)
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' already taken",
                changes.username
            )));
        }
        let user = tables
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| AppError::not_found("User", id))?;
        user.username = changes.username;
        user.first_name = changes.first_name;
        user.last_name = changes.last_name;
        user.email = changes.email;
        user.age = changes.age;
        Ok(user.clone())
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn list_news(&self, limit: i64, offset: i64) -> Result<Vec<News>, AppError> {
        let tables = self.tables.read().await;
        let mut news: Vec<News> = tables.news.iter().filter(|n| !n.deleted).cloned().collect();
        news.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(news
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_news(&self) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.news.iter().filter(|n| !n.deleted).count() as i64)
    }

    async fn find_news(&self, id: i32) -> Result<Option<News>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.news.iter().find(|n| n.id == id).cloned())
    }

    async fn create_news(&self, form: &NewsForm) -> Result<News, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let news = News {
            id: tables.next_id(),
            title: form.title.clone(),
            preambule: form.preambule.clone(),
            body: form.body.clone(),
            created_at: now,
            updated_at: now,
            deleted: false,
        };
        tables.news.push(news.clone());
        Ok(news)
    }

    async fn update_news(&self, id: i32, form: &NewsForm) -> Result<News, AppError> {
        let mut tables = self.tables.write().await;
        let news = tables
            .news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::not_found("News", id))?;
        news.title = form.title.clone();
        news.preambule = form.preambule.clone();
        news.body = form.body.clone();
        news.updated_at = Utc::now();
        Ok(news.clone())
    }

    async fn soft_delete_news(&self, id: i32) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let news = tables
            .news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::not_found("News", id))?;
        news.deleted = true;
        news.updated_at = Utc::now();
        Ok(())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().filter(|c| !c.deleted).cloned().collect())
    }

    async fn find_course(&self, id: i32) -> Result<Option<Course>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn lessons_for_course(&self, course_id: i32) -> Result<Vec<Lesson>, AppError> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .iter()
            .filter(|l| l.course_id == course_id && !l.deleted)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.num);
        Ok(lessons)
    }

    async fn teachers_for_course(&self, course_id: i32) -> Result<Vec<CourseTeacher>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .teachers
            .iter()
            .filter(|t| !t.deleted)
            .filter(|t| {
                tables
                    .teacher_courses
                    .iter()
                    .any(|(teacher_id, course)| *teacher_id == t.id && *course == course_id)
            })
            .cloned()
            .collect())
    }

    async fn feedback_for_course(
        &self,
        course_id: i32,
        limit: i64,
    ) -> Result<Vec<CourseFeedback>, AppError> {
        let tables = self.tables.read().await;
        let mut feedback: Vec<CourseFeedback> = tables
            .feedback
            .iter()
            .filter(|f| f.course_id == course_id && !f.deleted)
            .cloned()
            .collect();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        feedback.truncate(limit.max(0) as usize);
        Ok(feedback)
    }

    async fn create_feedback(
        &self,
        user_id: i32,
        form: &CourseFeedbackForm,
    ) -> Result<CourseFeedback, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.courses.iter().any(|c| c.id == form.course_id && !c.deleted) {
            return Err(AppError::not_found("Course", form.course_id));
        }
        let feedback = CourseFeedback {
            id: tables.next_id(),
            course_id: form.course_id,
            user_id,
            feedback: form.feedback.clone(),
            rating: form.rating,
            created_at: Utc::now(),
            deleted: false,
        };
        tables.feedback.push(feedback.clone());
        Ok(feedback)
    }
}
