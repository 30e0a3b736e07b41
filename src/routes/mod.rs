pub mod auth;
pub mod courses;
pub mod health;
pub mod news;
pub mod pages;

use actix_web::{error::UrlencodedError, web, HttpRequest};

use crate::error::AppError;

/// A body that does not decode into the form type, such as `rating=abc`,
/// is answered like a failed validation.
fn form_error(error: UrlencodedError, req: &HttpRequest) -> actix_web::Error {
    log::debug!("Undecodable form posted to {}: {}", req.path(), error);
    AppError::ValidationError(error.to_string()).into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error))
        .service(health::health)
        .service(pages::main_page)
        .service(pages::contacts_page)
        .service(pages::contacts)
        .service(news::news_list)
        .service(news::news_create_page)
        .service(news::news_create)
        .service(news::news_detail)
        .service(news::news_update_page)
        .service(news::news_update)
        .service(news::news_delete_page)
        .service(news::news_delete)
        .service(courses::courses_list)
        .service(courses::courses_detail)
        .service(courses::course_feedback)
        .service(
            web::scope("/authapp")
                .service(auth::login_page)
                .service(auth::login)
                .service(auth::logout)
                .service(auth::register_page)
                .service(auth::register)
                .service(auth::profile_edit_page)
                .service(auth::profile_edit),
        );
}
