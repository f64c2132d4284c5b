//! Field validators
//!
//! Character-set rules for free-text and filesystem-path fields. They run on
//! every create/update before anything reaches the database, independently of
//! the parameter binding done by the driver.
//!
//! The validators have the `validator` custom-function shape so input
//! structs can use them with `#[validate(custom(function = ...))]`.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

static FORBIDDEN_TEXT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>;]").expect("forbidden characters regex"));

// Word characters, whitespace, ASCII punctuation and accented Latin letters.
static ALLOWED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"^[\w\s!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~áéíóúãâêîôûäëïöü]+$"##)
        .expect("allowed text regex")
});

static ALLOWED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-/\.]+$").expect("allowed path regex"));

static SLUG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug regex"));

fn rejection(code: &'static str, message: &'static str, value: &str) -> ValidationError {
    tracing::debug!(value = %value, code = code, "Field value rejected");
    let mut err = ValidationError::new(code).with_message(Cow::Borrowed(message));
    err.add_param(Cow::Borrowed("value"), &value);
    err
}

/// Free-text rule for titles, descriptions, slugs and tag names.
///
/// Values containing `<`, `>` or `;` are rejected outright. Anything else
/// must consist of word characters, whitespace, common punctuation and the
/// accented letters used in Portuguese.
pub fn validate_text(value: &str) -> Result<(), ValidationError> {
    if FORBIDDEN_TEXT_CHARS.is_match(value) {
        return Err(rejection(
            "special_characters",
            "O campo não deve conter caracteres especiais como '<', '>', ou ';'.",
            value,
        ));
    }

    if !ALLOWED_TEXT.is_match(value) {
        return Err(rejection(
            "invalid_characters",
            "O campo só pode conter letras, números, espaços e pontuação comum.",
            value,
        ));
    }

    Ok(())
}

/// Path rule for stored media locations: word characters, `-`, `/` and `.` only.
pub fn validate_file_path(value: &str) -> Result<(), ValidationError> {
    if !ALLOWED_PATH.is_match(value) {
        return Err(rejection(
            "invalid_path",
            "O campo vídeo deve conter apenas letras, números, underscores, hífens, barras e pontos.",
            value,
        ));
    }
    Ok(())
}

/// Slug rule: the free-text rule plus the slug shape (ASCII letters, digits,
/// hyphens and underscores).
pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    validate_text(value)?;
    if !SLUG_SHAPE.is_match(value) {
        return Err(rejection(
            "invalid_slug",
            "Informe um slug válido composto de letras, números, underscores ou hífens.",
            value,
        ));
    }
    Ok(())
}

/// Build a URL slug from a title, transliterating accented letters.
pub fn slugify(title: &str) -> String {
    slug::slugify(title)
}
