use crate::{
    auth::StaffUser,
    error::AppError,
    messages::Messages,
    models::{News, NewsForm},
    response::{form_errors, redirect, render},
    state::AppState,
    urls,
};
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

pub const NEWS_PER_PAGE: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Position of a page within the news list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    /// Validates a requested page number against `count` items. The first page
    /// always exists, even when the list is empty.
    pub fn new(requested: Option<&str>, count: i64, per_page: i64) -> Result<Self, AppError> {
        let number = match requested {
            None => 1,
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::NotFound(format!("Invalid page '{}'", raw)))?,
        };
        let num_pages = ((count + per_page - 1) / per_page).max(1);
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound(format!("Page {} does not exist", number)));
        }
        Ok(Self {
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
        })
    }

    pub fn offset(&self, per_page: i64) -> i64 {
        (self.number - 1) * per_page
    }
}

async fn load_news(state: &AppState, pk: i32) -> Result<News, AppError> {
    state
        .content
        .find_news(pk)
        .await?
        .ok_or_else(|| AppError::not_found("News", pk))
}

/// Lists news that are not deleted, newest first, five per page.
///
/// ## Query Parameters:
/// - `page` (optional): 1-based page number. Pages past the end are `404 Not Found`.
#[get("/news/")]
pub async fn news_list(
    state: web::Data<AppState>,
    messages: Messages,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let count = state.content.count_news().await?;
    let page = PageInfo::new(query.page.as_deref(), count, NEWS_PER_PAGE)?;
    let news = state
        .content
        .list_news(NEWS_PER_PAGE, page.offset(NEWS_PER_PAGE))
        .await?;

    Ok(render(
        "mainapp:news",
        &messages,
        json!({ "object_list": news, "page": page }),
    ))
}

#[get("/news/create/")]
pub async fn news_create_page(_staff: StaffUser, messages: Messages) -> HttpResponse {
    render(
        "mainapp:news_create",
        &messages,
        json!({ "form": NewsForm::default(), "errors": {} }),
    )
}

/// Creates a news item.
///
/// ## Responses:
/// - `302 Found`: Created, redirects to the news list. Anonymous visitors are
///   redirected to the login page instead.
/// - `200 OK`: The form is rendered again with field errors.
/// - `403 Forbidden`: The user is not staff.
#[post("/news/create/")]
pub async fn news_create(
    state: web::Data<AppState>,
    staff: StaffUser,
    messages: Messages,
    form: web::Form<NewsForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    if let Err(errors) = form.validate() {
        return Ok(render(
            "mainapp:news_create",
            &messages,
            json!({ "form": form, "errors": form_errors(&errors) }),
        ));
    }

    let news = state.content.create_news(&form).await?;
    log::info!("News {} created by '{}'", news.id, staff.0.username);
    Ok(redirect(urls::news()))
}

/// Shows one news item. Deleted items are `404 Not Found`.
#[get("/news/{pk:\\d+}/")]
pub async fn news_detail(
    state: web::Data<AppState>,
    messages: Messages,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let pk = path.into_inner();
    let news = load_news(&state, pk).await?;
    if news.deleted {
        return Err(AppError::not_found("News", pk));
    }
    Ok(render("mainapp:news_detail", &messages, json!({ "object": news })))
}

#[get("/news/{pk:\\d+}/update/")]
pub async fn news_update_page(
    state: web::Data<AppState>,
    _staff: StaffUser,
    messages: Messages,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let news = load_news(&state, path.into_inner()).await?;
    Ok(render(
        "mainapp:news_update",
        &messages,
        json!({ "object": &news, "form": NewsForm::from(&news), "errors": {} }),
    ))
}

/// Saves changes to a news item and redirects to its page.
#[post("/news/{pk:\\d+}/update/")]
pub async fn news_update(
    state: web::Data<AppState>,
    staff: StaffUser,
    messages: Messages,
    path: web::Path<i32>,
    form: web::Form<NewsForm>,
) -> Result<HttpResponse, AppError> {
    let news = load_news(&state, path.into_inner()).await?;
    let form = form.into_inner();
    if let Err(errors) = form.validate() {
        return Ok(render(
            "mainapp:news_update",
            &messages,
            json!({ "object": news, "form": form, "errors": form_errors(&errors) }),
        ));
    }

    let updated = state.content.update_news(news.id, &form).await?;
    log::info!("News {} updated by '{}'", updated.id, staff.0.username);
    Ok(redirect(urls::news_detail(updated.id)))
}

/// Confirmation page of a deletion.
#[get("/news/{pk:\\d+}/delete/")]
pub async fn news_delete_page(
    state: web::Data<AppState>,
    _staff: StaffUser,
    messages: Messages,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let news = load_news(&state, path.into_inner()).await?;
    Ok(render("mainapp:news_delete", &messages, json!({ "object": news })))
}

/// Marks a news item deleted. The row is kept.
#[post("/news/{pk:\\d+}/delete/")]
pub async fn news_delete(
    state: web::Data<AppState>,
    staff: StaffUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let news = load_news(&state, path.into_inner()).await?;
    state.content.soft_delete_news(news.id).await?;
    log::info!("News {} deleted by '{}'", news.id, staff.0.username);
    Ok(redirect(urls::news()))
}
