pub mod extractors;
pub mod password;
pub mod session;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::config::AdminAccount;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::NewUser;

// Re-export necessary items
pub use extractors::{AuthenticatedUser, StaffUser};
pub use password::{hash_password, verify_password};

lazy_static! {
    // Letters, digits and @/./+/-/_
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[\w.@+-]+$").unwrap();
}

/// Messages the login form reports when a submission is rejected.
/// Every entry is flashed to the user on a failed login.
pub const LOGIN_ERROR_MESSAGES: &[&str] = &[
    "Please enter a correct username and password. Note that both fields may be case-sensitive.",
    "This account is inactive.",
];

/// Whether `requester_id` may edit the profile of `target_id`. Only the owner may.
pub fn can_edit(requester_id: i32, target_id: i32) -> bool {
    requester_id == target_id
}

/// Creates the configured staff account unless its username is already taken.
/// Returns whether an account was created.
pub async fn ensure_staff_account(
    users: &dyn UserRepository,
    admin: &AdminAccount,
) -> Result<bool, AppError> {
    if users.find_user_by_username(&admin.username).await?.is_some() {
        return Ok(false);
    }
    let user = users
        .create_user(NewUser {
            username: admin.username.clone(),
            first_name: String::new(),
            last_name: String::new(),
            email: admin.email.clone(),
            age: None,
            password_hash: hash_password(&admin.password)?,
            is_staff: true,
        })
        .await?;
    log::info!("Created staff account '{}' ({})", user.username, user.id);
    Ok(true)
}

/// Payload of the login form.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
    /// Where to go after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

/// Payload of the registration form.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    /// Between 1 and 150 characters: letters, digits and @/./+/-/_.
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = "USERNAME_REGEX",
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    /// Raw text of the optional age field, parsed by `clean`.
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterForm {
    /// Field validation plus the password confirmation check.
    /// Yields the parsed age when the form is valid.
    pub fn clean(&self) -> Result<Option<i32>, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        let age = clean_age(&self.age, &mut errors);
        if self.password1 != self.password2 {
            errors.add(
                "password2",
                field_error("password_mismatch", "The two password fields didn't match."),
            );
        }
        if errors.is_empty() {
            Ok(age)
        } else {
            Err(errors)
        }
    }
}

/// Payload of the profile edit form.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = "USERNAME_REGEX",
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    /// Raw text of the optional age field, parsed by `clean`.
    #[serde(default)]
    pub age: String,
}

impl ProfileForm {
    /// Field validation. Yields the parsed age when the form is valid.
    pub fn clean(&self) -> Result<Option<i32>, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        let age = clean_age(&self.age, &mut errors);
        if errors.is_empty() {
            Ok(age)
        } else {
            Err(errors)
        }
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Parses the optional age field. Blank means not given.
pub fn parse_age(raw: &str) -> Result<Option<i32>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let age: i32 = raw
        .parse()
        .map_err(|_| field_error("invalid", "Enter a whole number."))?;
    if !(0..=150).contains(&age) {
        return Err(field_error("range", "Ensure this value is between 0 and 150."));
    }
    Ok(Some(age))
}

fn clean_age(raw: &str, errors: &mut ValidationErrors) -> Option<i32> {
    match parse_age(raw) {
        Ok(age) => age,
        Err(error) => {
            errors.add("age", error);
            None
        }
    }
}
