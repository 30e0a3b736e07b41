use crate::{
    auth::AuthenticatedUser,
    cache::{self, feedback_list_key},
    error::AppError,
    messages::Messages,
    models::{Course, CourseFeedback, CourseFeedbackForm},
    response::{redirect, render},
    state::AppState,
    urls,
};
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use validator::Validate;

/// How many feedbacks a course page shows.
pub const FEEDBACK_ON_PAGE: i64 = 5;

async fn load_course(state: &AppState, pk: i32) -> Result<Course, AppError> {
    match state.content.find_course(pk).await? {
        Some(course) if !course.deleted => Ok(course),
        _ => Err(AppError::not_found("Course", pk)),
    }
}

/// Feedback list of a course, served from the cache when present.
///
/// On a miss the list is read from storage and cached for the configured TTL.
pub async fn cached_feedback(state: &AppState, course_id: i32) -> Result<Vec<CourseFeedback>, AppError> {
    let key = feedback_list_key(course_id);
    if let Some(cached) = cache::get_json::<Vec<CourseFeedback>>(state.cache.as_ref(), &key).await? {
        log::debug!("Feedback list of course {} served from cache", course_id);
        return Ok(cached);
    }

    let feedback = state
        .content
        .feedback_for_course(course_id, FEEDBACK_ON_PAGE)
        .await?;
    cache::set_json(
        state.cache.as_ref(),
        &key,
        &feedback,
        Some(state.settings.feedback_cache_ttl),
    )
    .await?;
    Ok(feedback)
}

#[get("/courses/")]
pub async fn courses_list(
    state: web::Data<AppState>,
    messages: Messages,
) -> Result<HttpResponse, AppError> {
    let courses = state.content.list_courses().await?;
    Ok(render("mainapp:courses", &messages, json!({ "object_list": courses })))
}

/// Course page: the course with its lessons, teachers and latest feedback.
#[get("/courses/{pk:\\d+}/")]
pub async fn courses_detail(
    state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
    messages: Messages,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let course = load_course(&state, path.into_inner()).await?;
    let lessons = state.content.lessons_for_course(course.id).await?;
    let teachers = state.content.teachers_for_course(course.id).await?;
    let feedback_list = cached_feedback(&state, course.id).await?;

    Ok(render(
        "mainapp:courses_detail",
        &messages,
        json!({
            "course_object": course,
            "lessons": lessons,
            "teachers": teachers,
            "feedback_list": feedback_list,
            "feedback_form": user.is_some(),
        }),
    ))
}

/// Leaves a feedback on a course and drops the course's cached feedback list.
///
/// ## Responses:
/// - `302 Found`: Saved, redirects to the course page.
/// - `404 Not Found`: No such course.
/// - `422 Unprocessable Entity`: Empty feedback, or a rating that is not a number
///   in 1..=5.
#[post("/course_feedback/")]
pub async fn course_feedback(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    messages: Messages,
    form: web::Form<CourseFeedbackForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    form.validate()?;
    let course = load_course(&state, form.course_id).await?;

    let feedback = state.content.create_feedback(user.0.id, &form).await?;
    state.cache.delete(&feedback_list_key(course.id)).await?;
    log::info!(
        "Feedback {} on course {} by user {}",
        feedback.id,
        course.id,
        user.0.id
    );

    messages.success("Thank you for your feedback!")?;
    Ok(redirect(urls::courses_detail(course.id)))
}
