pub mod course;
pub mod news;
pub mod user;

pub use course::{Course, CourseFeedback, CourseFeedbackForm, CourseTeacher, Lesson};
pub use news::{News, NewsForm};
pub use user::{NewUser, User, UserChanges};
