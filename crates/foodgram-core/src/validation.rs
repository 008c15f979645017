//! Request validation rules shared by the services and the CLI.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::RecipeLimits;
use crate::error::AppError;
use crate::models::{NewTag, NewUser, RecipeDraft, RecipeInput};

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const NAME_MAX_LENGTH: usize = 150;
pub const FIELD_MAX_LENGTH: usize = 200;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Usernames that would collide with `/users/<name>/` style routes.
pub const RESERVED_USERNAMES: &[&str] = &["me", "username", "subscriptions", "subscribe"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(field, "This field is required.")),
    }
}

fn max_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::validation(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(())
}

/// Validated registration fields. The password is still in clear text.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub fn validate_registration(input: NewUser) -> Result<ValidRegistration, AppError> {
    let email = required("email", input.email)?.to_lowercase();
    max_length("email", &email, EMAIL_MAX_LENGTH)?;
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::validation("email", "Enter a valid email address."));
    }

    let username = required("username", input.username)?;
    max_length("username", &username, NAME_MAX_LENGTH)?;
    if !USERNAME_RE.is_match(&username) {
        return Err(AppError::validation(
            "username",
            "Username may contain only letters, digits and @/./+/-/_ characters.",
        ));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(AppError::validation(
            "username",
            format!("The username '{username}' is reserved."),
        ));
    }

    let first_name = required("first_name", input.first_name)?;
    max_length("first_name", &first_name, NAME_MAX_LENGTH)?;
    let last_name = required("last_name", input.last_name)?;
    max_length("last_name", &last_name, NAME_MAX_LENGTH)?;

    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("password", "This field is required."))?;
    validate_password("password", &password, &[&username, &email])?;

    Ok(ValidRegistration {
        email,
        username,
        first_name,
        last_name,
        password,
    })
}

/// Password strength rules: minimum length, not purely numeric, not equal
/// to any of the user's own attributes.
pub fn validate_password(field: &str, password: &str, attributes: &[&str]) -> Result<(), AppError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(AppError::validation(
            field,
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."),
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(field, "This password is entirely numeric."));
    }
    let lowered = password.to_lowercase();
    if attributes
        .iter()
        .any(|attr| !attr.is_empty() && attr.to_lowercase() == lowered)
    {
        return Err(AppError::validation(
            field,
            "The password is too similar to your account details.",
        ));
    }
    Ok(())
}

pub fn validate_tag(tag: &NewTag) -> Result<(), AppError> {
    if tag.name.trim().is_empty() {
        return Err(AppError::validation("name", "This field is required."));
    }
    max_length("name", &tag.name, FIELD_MAX_LENGTH)?;
    if !COLOR_RE.is_match(&tag.color) {
        return Err(AppError::validation(
            "color",
            "Color must be a hex string such as #49B64E.",
        ));
    }
    max_length("slug", &tag.slug, FIELD_MAX_LENGTH)?;
    if !SLUG_RE.is_match(&tag.slug) {
        return Err(AppError::validation(
            "slug",
            "Slug may contain only letters, digits, hyphens and underscores.",
        ));
    }
    Ok(())
}

/// Check everything about a recipe payload that can be decided without the
/// database: presence, bounds, and duplicate references.
///
/// Existence of the referenced ingredients and tags is checked by the
/// service against the catalog.
pub fn validate_recipe(input: RecipeInput, limits: &RecipeLimits) -> Result<RecipeDraft, AppError> {
    let name = required("name", input.name)?;
    max_length("name", &name, FIELD_MAX_LENGTH)?;
    let text = required("text", input.text)?;

    let cooking_time = input
        .cooking_time
        .ok_or_else(|| AppError::validation("cooking_time", "This field is required."))?;
    if cooking_time < limits.min_cooking_time as i64 {
        return Err(AppError::validation(
            "cooking_time",
            format!("Cooking time must be at least {}.", limits.min_cooking_time),
        ));
    }
    if cooking_time > limits.max_cooking_time as i64 {
        return Err(AppError::validation(
            "cooking_time",
            format!("Cooking time must not exceed {}.", limits.max_cooking_time),
        ));
    }

    let ingredients = input
        .ingredients
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AppError::validation("ingredients", "This field is required."))?;
    for item in &ingredients {
        if item.amount < limits.min_amount || item.amount > limits.max_amount {
            return Err(AppError::validation(
                "ingredients",
                format!(
                    "Amount for ingredient {} must be between {} and {}.",
                    item.id, limits.min_amount, limits.max_amount
                ),
            ));
        }
    }
    let mut seen = HashSet::new();
    if !ingredients.iter().all(|item| seen.insert(item.id)) {
        return Err(AppError::validation(
            "ingredients",
            "Ingredients must not repeat.",
        ));
    }

    let tags = input
        .tags
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AppError::validation("tags", "This field is required."))?;
    let mut seen = HashSet::new();
    if !tags.iter().all(|id| seen.insert(*id)) {
        return Err(AppError::validation("tags", "Tags must not repeat."));
    }

    Ok(RecipeDraft {
        name,
        text,
        cooking_time: cooking_time as i32,
        tags,
        ingredients,
        image: input.image,
    })
}
