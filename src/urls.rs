//! Paths of the named routes.
//!
//! Handlers and tests build links through these functions instead of
//! spelling out literal paths, so a route only changes in one place.

use url::form_urlencoded;

pub fn main_page() -> String {
    "/".to_string()
}

pub fn news() -> String {
    "/news/".to_string()
}

pub fn news_detail(pk: i32) -> String {
    format!("/news/{}/", pk)
}

pub fn news_create() -> String {
    "/news/create/".to_string()
}

pub fn news_update(pk: i32) -> String {
    format!("/news/{}/update/", pk)
}

pub fn news_delete(pk: i32) -> String {
    format!("/news/{}/delete/", pk)
}

pub fn courses() -> String {
    "/courses/".to_string()
}

pub fn courses_detail(pk: i32) -> String {
    format!("/courses/{}/", pk)
}

pub fn course_feedback() -> String {
    "/course_feedback/".to_string()
}

pub fn contacts() -> String {
    "/contacts/".to_string()
}

pub fn login() -> String {
    "/authapp/login/".to_string()
}

/// Login page that sends the user back to `next` afterwards.
pub fn login_with_next(next: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", login(), query)
}

pub fn logout() -> String {
    "/authapp/logout/".to_string()
}

pub fn register() -> String {
    "/authapp/register/".to_string()
}

pub fn profile_edit(pk: i32) -> String {
    format!("/authapp/profile_edit/{}/", pk)
}

/// Returns `next` when it is a local absolute path, so a login form cannot
/// be used to bounce visitors to another host.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    next.filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
        .map(str::to_string)
}
