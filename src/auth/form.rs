//! Login and signup form state with client-side validation
//!
//! Errors are computed on demand; a field's error is only shown once the
//! field has been touched or a submit was attempted.

use std::fmt;

use super::client::{LoginRequest, SignupRequest};

pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 255;
pub const FULL_NAME_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
}

impl FieldError {
    /// User-facing message for a field labelled `label`
    pub fn message(&self, label: &str) -> String {
        match self {
            FieldError::Required => format!("{} is required", label),
            FieldError::Email => "Please enter a valid email".to_string(),
            FieldError::MinLength(n) => format!("{} must be at least {} characters", label, n),
            FieldError::MaxLength(n) => format!("{} must be at most {} characters", label, n),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message("Field"))
    }
}

pub fn required(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        Err(FieldError::Required)
    } else {
        Ok(())
    }
}

/// `local@domain.tld`, no whitespace. Empty values pass (see `required`).
pub fn email(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Ok(());
    }
    let valid = (|| {
        if value.chars().any(char::is_whitespace) {
            return false;
        }
        let (local, domain) = match value.split_once('@') {
            Some(parts) => parts,
            None => return false,
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2
            && labels
                .iter()
                .all(|l| !l.is_empty() && l.chars().all(|c| c.is_alphanumeric() || c == '-'))
    })();
    if valid {
        Ok(())
    } else {
        Err(FieldError::Email)
    }
}

/// Empty values pass (see `required`)
pub fn min_length(value: &str, min: usize) -> Result<(), FieldError> {
    if !value.is_empty() && value.chars().count() < min {
        Err(FieldError::MinLength(min))
    } else {
        Ok(())
    }
}

pub fn max_length(value: &str, max: usize) -> Result<(), FieldError> {
    if value.chars().count() > max {
        Err(FieldError::MaxLength(max))
    } else {
        Ok(())
    }
}

/// First failing validator
fn first_error(checks: impl IntoIterator<Item = Result<(), FieldError>>) -> Option<FieldError> {
    checks.into_iter().find_map(Result::err)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub value: String,
    pub touched: bool,
}

impl Field {
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.touched = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: Field,
    pub password: Field,
    pub submitted: bool,
}

impl LoginForm {
    pub fn field(&self, field: LoginField) -> &Field {
        match field {
            LoginField::Username => &self.username,
            LoginField::Password => &self.password,
        }
    }

    pub fn error(&self, field: LoginField) -> Option<FieldError> {
        let value = &self.field(field).value;
        match field {
            LoginField::Username => first_error([required(value)]),
            LoginField::Password => first_error([required(value)]),
        }
    }

    pub fn validate(&self) -> Vec<(LoginField, FieldError)> {
        [LoginField::Username, LoginField::Password]
            .into_iter()
            .filter_map(|f| self.error(f).map(|e| (f, e)))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// The error to display for `field`, if any
    pub fn visible_error(&self, field: LoginField) -> Option<FieldError> {
        if self.submitted || self.field(field).touched {
            self.error(field)
        } else {
            None
        }
    }

    pub fn request(&self) -> LoginRequest {
        LoginRequest {
            username: self.username.value.clone(),
            password: self.password.value.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Username,
    Email,
    Password,
    FullName,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: Field,
    pub email: Field,
    pub password: Field,
    /// Optional
    pub full_name: Field,
    pub submitted: bool,
}

impl SignupForm {
    pub const FIELDS: [SignupField; 4] = [
        SignupField::Username,
        SignupField::Email,
        SignupField::Password,
        SignupField::FullName,
    ];

    pub fn field(&self, field: SignupField) -> &Field {
        match field {
            SignupField::Username => &self.username,
            SignupField::Email => &self.email,
            SignupField::Password => &self.password,
            SignupField::FullName => &self.full_name,
        }
    }

    pub fn error(&self, field: SignupField) -> Option<FieldError> {
        let value = &self.field(field).value;
        match field {
            SignupField::Username => first_error([required(value), max_length(value, USERNAME_MAX)]),
            SignupField::Email => first_error([required(value), email(value), max_length(value, EMAIL_MAX)]),
            SignupField::Password => first_error([required(value), min_length(value, PASSWORD_MIN)]),
            SignupField::FullName => first_error([max_length(value, FULL_NAME_MAX)]),
        }
    }

    pub fn validate(&self) -> Vec<(SignupField, FieldError)> {
        Self::FIELDS
            .into_iter()
            .filter_map(|f| self.error(f).map(|e| (f, e)))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    pub fn visible_error(&self, field: SignupField) -> Option<FieldError> {
        if self.submitted || self.field(field).touched {
            self.error(field)
        } else {
            None
        }
    }

    pub fn request(&self) -> SignupRequest {
        SignupRequest {
            username: self.username.value.clone(),
            email: self.email.value.clone(),
            password: self.password.value.clone(),
            full_name: self.full_name.value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert_eq!(email("ada@example.com"), Ok(()));
        assert_eq!(email("a.b+c@mail.example.org"), Ok(()));
        assert_eq!(email(""), Ok(()));
        assert_eq!(email("ada@example"), Err(FieldError::Email));
        assert_eq!(email("ada example@x.com"), Err(FieldError::Email));
        assert_eq!(email("@example.com"), Err(FieldError::Email));
        assert_eq!(email("a@b@c.com"), Err(FieldError::Email));
        assert_eq!(email("a@example..com"), Err(FieldError::Email));
    }

    #[test]
    fn test_length_validators() {
        assert_eq!(min_length("12345", 6), Err(FieldError::MinLength(6)));
        assert_eq!(min_length("123456", 6), Ok(()));
        assert_eq!(min_length("", 6), Ok(()));
        assert_eq!(max_length(&"x".repeat(51), USERNAME_MAX), Err(FieldError::MaxLength(50)));
    }

    #[test]
    fn test_login_errors_hidden_until_touched() {
        let mut form = LoginForm::default();
        assert!(!form.is_valid());
        assert_eq!(form.visible_error(LoginField::Username), None);

        form.username.set("");
        assert_eq!(form.visible_error(LoginField::Username), Some(FieldError::Required));
        assert_eq!(form.visible_error(LoginField::Password), None);

        form.submitted = true;
        assert_eq!(form.visible_error(LoginField::Password), Some(FieldError::Required));
    }

    #[test]
    fn test_signup_full_name_optional() {
        let mut form = SignupForm::default();
        form.username.set("ada");
        form.email.set("ada@example.com");
        form.password.set("secret1");
        assert!(form.is_valid());

        form.password.set("short");
        assert_eq!(form.validate(), vec![(SignupField::Password, FieldError::MinLength(6))]);

        let req = form.request();
        assert_eq!(req.full_name, "");
        assert_eq!(req.email, "ada@example.com");
    }

    #[test]
    fn test_messages() {
        assert_eq!(FieldError::Required.message("Username"), "Username is required");
        assert_eq!(
            FieldError::MinLength(6).message("Password"),
            "Password must be at least 6 characters"
        );
    }
}
