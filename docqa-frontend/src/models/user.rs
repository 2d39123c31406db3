use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

// Checked by hand so the secret never lands in the error params.
fn check_password(password: &Secret<String>, errors: &mut ValidationErrors) {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            invalid("length", "Password must be at least 6 characters"),
        );
    }
}

fn check_email(email_id: &str, errors: &mut ValidationErrors) {
    if !email_id.validate_email() {
        errors.add("email_id", invalid("email", "Enter a valid email"));
    }
}

fn check_required(
    field: &'static str,
    value: &str,
    message: &'static str,
    errors: &mut ValidationErrors,
) {
    if value.trim().is_empty() {
        errors.add(field, invalid("length", message));
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email_id: String,
    pub password: Secret<String>,
}

impl Validate for LoginForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&self.email_id, &mut errors);
        check_password(&self.password, &mut errors);
        into_result(errors)
    }
}

impl LoginForm {
    pub fn new(email_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email_id: email_id.into(),
            password: Secret::new(password.into()),
        }
    }

    pub(crate) fn payload(&self) -> LoginPayload<'_> {
        LoginPayload {
            email_id: &self.email_id,
            password: self.password.expose_secret(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email_id: String,
    pub password: Secret<String>,
}

impl Validate for SignupForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_required("first_name", &self.first_name, "First name is required", &mut errors);
        check_required("last_name", &self.last_name, "Last name is required", &mut errors);
        check_email(&self.email_id, &mut errors);
        check_password(&self.password, &mut errors);
        into_result(errors)
    }
}

impl SignupForm {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email_id: email_id.into(),
            password: Secret::new(password.into()),
        }
    }

    pub(crate) fn payload(&self) -> SignupPayload<'_> {
        SignupPayload {
            first_name: &self.first_name,
            last_name: &self.last_name,
            email_id: &self.email_id,
            password: self.password.expose_secret(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct LoginPayload<'a> {
    pub email_id: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SignupPayload<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email_id: &'a str,
    pub password: &'a str,
}

/// Outcome of a successful login or signup. The credential itself lives in the
/// HTTP client's cookie store, never here.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub email: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Auth,
    Upload,
    Chat,
}

impl Screen {
    /// Screens reachable without a session. Entering one drops the session.
    pub fn is_public(self) -> bool {
        matches!(self, Screen::Landing | Screen::Auth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    /// Signed in, nothing uploaded yet.
    Authenticated,
    /// Signed in with at least one document to ask about.
    Ready,
}
