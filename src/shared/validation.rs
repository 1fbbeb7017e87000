//! Translation from `validator` derive output to `AppError`.

use validator::ValidationErrors;

use super::error::{AppError, FieldError};

/// Flatten validation errors into a single `AppError::Validation`.
///
/// Every failing field contributes one `field: message` entry; the
/// joined list becomes the response message so the operator sees all
/// problems in one round trip.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_deref()
                    .unwrap_or("is invalid")
                    .to_string(),
            })
        })
        .collect();

    if field_errors.is_empty() {
        return AppError::Validation("Validation failed".into());
    }

    let message = field_errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    AppError::Validation(message)
}
