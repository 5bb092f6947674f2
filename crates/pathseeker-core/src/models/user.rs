use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account type chosen at registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Graduate,
    Professional,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Student, UserRole::Graduate, UserRole::Professional];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Graduate => "graduate",
            UserRole::Professional => "professional",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::Student => "Student",
            UserRole::Graduate => "Recent Graduate",
            UserRole::Professional => "Working Professional",
        }
    }

    /// Parse a role from user input; unknown or empty input is None
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s || role.display_name().to_lowercase() == s)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Please fill in email and password fields.")]
    MissingFields,

    #[error("Passwords do not match.")]
    PasswordMismatch,
}

/// Sign-up form contents
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<UserRole>,
}

/// Body of `POST users/`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewUser {
    pub uname: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl Registration {
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.email.is_empty() || self.password.is_empty() || self.confirm_password.is_empty() {
            return Err(RegistrationError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        Ok(())
    }

    /// Username sent to the backend: the chosen username, else the full
    /// name, else the local part of the email address.
    pub fn uname(&self) -> String {
        let username = self.username.trim();
        if !username.is_empty() {
            return username.to_string();
        }
        let full_name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full_name = full_name.trim();
        if !full_name.is_empty() {
            return full_name.to_string();
        }
        self.email.split('@').next().unwrap_or_default().to_string()
    }

    /// Validate the form and build the request body
    pub fn to_new_user(&self) -> Result<NewUser, RegistrationError> {
        self.validate()?;
        Ok(NewUser {
            uname: self.uname(),
            email: self.email.clone(),
            password: self.password.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role.unwrap_or_default(),
        })
    }
}

/// Response of `GET auth/me/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentUser {
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "uname")]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl CurrentUser {
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        format!("{} {}", first, last).trim().to_string()
    }

    /// Name to greet the user with
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if !name.is_empty() {
            name
        } else if let Some(ref username) = self.username {
            username.clone()
        } else {
            self.email.clone().unwrap_or_else(|| format!("user #{}", self.user_id))
        }
    }
}

/// Body of `PATCH auth/me/`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
}
