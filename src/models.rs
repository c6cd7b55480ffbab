use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const CONTACT_MESSAGE_MIN_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn new(raw: &str) -> Result<Self, AuthorNameEmptyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Err(AuthorNameEmptyError)
        } else {
            Ok(Self(trimmed.into()))
        }
    }

    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("Author name cannot be empty")]
pub struct AuthorNameEmptyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(raw: &str) -> Result<Self, EmailAddressError> {
        let trimmed = raw.trim();
        if Self::is_valid(trimmed) {
            Ok(Self(trimmed.into()))
        } else {
            Err(EmailAddressError(trimmed.into()))
        }
    }

    fn is_valid(s: &str) -> bool {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(concat!(
                r"^[a-zA-Z0-9!#$%&'*+\-/=?^_`{|}~]+(\.[a-zA-Z0-9!#$%&'*+\-/=?^_`{|}~]+)*",
                r"@[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*(\.[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*)*\.[a-zA-Z]{2,}$",
            ))
            .expect("email pattern is valid")
        });
        RE.is_match(s)
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug)]
#[error("{0} is not a valid email address")]
pub struct EmailAddressError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: u64,
    name: AuthorName,
}

impl Author {
    pub const fn new(id: u64, name: AuthorName) -> Self {
        Self { id, name }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }

    pub fn rename(&mut self, name: AuthorName) {
        self.name = name;
    }
}

#[derive(Debug)]
pub struct CreateAuthorRequest {
    name: AuthorName,
}

impl CreateAuthorRequest {
    pub const fn new(name: AuthorName) -> Self {
        Self { name }
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }
}

#[derive(Error, Debug)]
#[error(transparent)]
pub struct CreateAuthorError(#[from] pub anyhow::Error);

#[derive(Error, Debug)]
#[error(transparent)]
pub struct FindAllAuthorsError(#[from] pub anyhow::Error);

#[derive(Debug)]
pub struct UpdateAuthorRequest {
    id: u64,
    name: AuthorName,
}

impl UpdateAuthorRequest {
    pub const fn new(id: u64, name: AuthorName) -> Self {
        Self { id, name }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn name(&self) -> &AuthorName {
        &self.name
    }
}

#[derive(Error, Debug)]
pub enum UpdateAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: u64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug)]
pub struct DeleteAuthorRequest {
    id: u64,
}

impl DeleteAuthorRequest {
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Error, Debug)]
pub enum DeleteAuthorError {
    #[error("Author with id \"{id}\" does not exist")]
    NotFound { id: u64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A validated contact form submission. Nothing is stored; the message is
/// only logged once accepted.
#[derive(Debug)]
pub struct ContactMessage {
    name: String,
    email: EmailAddress,
    message: String,
}

impl ContactMessage {
    /// Checks the fields in form order and reports the first failure only.
    pub fn new(
        name: Option<&str>,
        email: Option<&str>,
        message: Option<&str>,
    ) -> Result<Self, ContactMessageError> {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ContactMessageError::NameMissing)?;

        let email = email
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(ContactMessageError::EmailMissing)?;
        let email = EmailAddress::new(email)?;

        let message = message
            .filter(|message| !message.is_empty())
            .ok_or(ContactMessageError::MessageMissing)?;
        if message.chars().count() < CONTACT_MESSAGE_MIN_CHARS {
            return Err(ContactMessageError::MessageTooShort {
                min: CONTACT_MESSAGE_MIN_CHARS,
            });
        }

        Ok(Self {
            name: name.into(),
            email,
            message: message.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum ContactMessageError {
    #[error("Name is required")]
    NameMissing,
    #[error("Email is required")]
    EmailMissing,
    #[error(transparent)]
    Email(#[from] EmailAddressError),
    #[error("Message is required")]
    MessageMissing,
    #[error("Message must be at least {min} characters long")]
    MessageTooShort { min: usize },
}
