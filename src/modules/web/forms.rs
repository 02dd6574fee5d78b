//! Form bodies and their validation.
//!
//! Each form deserializes from an urlencoded body with every field
//! optional, and `validate` turns it into a typed value or the list of
//! field errors to show next to the inputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::contact::ContactMessage;
use crate::storage::{BlogPost, PostContent};

const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Errors grouped by field, the shape templates read.
    pub fn by_field(&self) -> BTreeMap<&'static str, Vec<&str>> {
        let mut map: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for error in &self.0 {
            map.entry(error.field).or_default().push(&error.message);
        }
        map
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

fn require(errors: &mut FormErrors, field: &'static str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
    }
    trimmed.to_string()
}

fn is_web_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterForm, FormErrors> {
        let mut errors = FormErrors::default();
        let email = require(&mut errors, "email", &self.email);
        let name = require(&mut errors, "name", &self.name);
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }

        errors.into_result(RegisterForm {
            email,
            name,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginForm, FormErrors> {
        let mut errors = FormErrors::default();
        let email = require(&mut errors, "email", &self.email);
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }

        errors.into_result(LoginForm {
            email,
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub img_url: String,
    pub body: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<PostContent, FormErrors> {
        let mut errors = FormErrors::default();
        let title = require(&mut errors, "title", &self.title);
        let subtitle = require(&mut errors, "subtitle", &self.subtitle);
        let img_url = require(&mut errors, "img_url", &self.img_url);
        if !img_url.is_empty() && !is_web_url(&img_url) {
            errors.add("img_url", "Invalid URL.");
        }
        let body = require(&mut errors, "body", &self.body);

        errors.into_result(PostContent {
            title,
            subtitle,
            body,
            img_url,
        })
    }
}

/// Editor values for an existing post.
impl From<&BlogPost> for PostForm {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CommentForm {
    pub body: String,
}

impl CommentForm {
    /// The comment text.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let body = require(&mut errors, "body", &self.body);
        errors.into_result(body)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(&self) -> Result<ContactMessage, FormErrors> {
        let mut errors = FormErrors::default();
        let name = require(&mut errors, "name", &self.name);
        let email = require(&mut errors, "email", &self.email);
        let message = require(&mut errors, "message", &self.message);

        errors.into_result(ContactMessage {
            name,
            email,
            phone: self.phone.trim().to_string(),
            message,
        })
    }
}
