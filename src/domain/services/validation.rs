use std::sync::LazyLock;
use base64::{Engine as _, engine::general_purpose};
use regex::Regex;
use crate::domain::models::ai::ImageFile;
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?([\w-]+\.)+[\w-]+(/[\w\-./?%&=]*)?$").expect("valid url regex")
});

pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_PATTERN.is_match(&email) {
        return Err(AppError::Validation("El correo electrónico no es válido.".into()));
    }
    Ok(email)
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "La contraseña debe tener al menos {} caracteres.", MIN_PASSWORD_LEN
        )));
    }
    if password != confirmation {
        return Err(AppError::Validation("Las contraseñas no coinciden.".into()));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "La descripción debe tener al menos {} caracteres.", MIN_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

pub fn is_valid_url(url: &str) -> bool {
    URL_PATTERN.is_match(url.trim())
}

/// Checks an uploaded image and returns its decoded size.
pub fn validate_image(image: &ImageFile) -> Result<usize, AppError> {
    if !image.mime_type.starts_with("image/") {
        return Err(AppError::Validation("Solo se admiten archivos de imagen.".into()));
    }
    let bytes = general_purpose::STANDARD
        .decode(image.base64.trim())
        .map_err(|_| AppError::Validation("El archivo no está codificado correctamente.".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("El archivo está vacío.".into()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Validation("La imagen supera el tamaño máximo de 4 MB.".into()));
    }
    Ok(bytes.len())
}
