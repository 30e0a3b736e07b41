use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A portal account as stored in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
    /// bcrypt hash, never sent to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// First and last name joined by a space, or `None` when both are blank.
    pub fn full_name(&self) -> Option<String> {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            None
        } else {
            Some(full.to_string())
        }
    }

    /// The name used when greeting the user.
    pub fn display_name(&self) -> String {
        self.full_name().unwrap_or_else(|| self.username.clone())
    }
}

/// Fields needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
    pub password_hash: String,
    pub is_staff: bool,
}

/// The self-service part of a profile.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first_name: &str, last_name: &str) -> User {
        User {
            id: 1,
            username: "admin".to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: "admin@example.com".to_string(),
            age: None,
            password_hash: "hash".to_string(),
            is_staff: true,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        assert_eq!(user("Ada", "Lovelace").display_name(), "Ada Lovelace");
        assert_eq!(user("Ada", "").display_name(), "Ada");
        assert_eq!(user("  ", "").display_name(), "admin");
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let json = serde_json::to_value(user("Ada", "Lovelace")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "admin");
    }
}
