//! # API Error Type
//!
//! Unified error type for marketplace commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in LowLow                                 │
//! │                                                                         │
//! │  UI                          Rust Backend                               │
//! │  ──                          ────────────                               │
//! │                                                                         │
//! │  create_order(...)                                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage failure? ─── DbError::QueryFailed ───── logged, generic │  │
//! │  │         │                                                  │     │  │
//! │  │         ▼                                                  ▼     │  │
//! │  │  Rule broken? ──── DbError::Domain(CoreError) ──────► ApiError ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ───────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_FUNDS",                                        │
//! │    "message": "Недостаточно средств на карте" }                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `message` is shown to the user as is, so it is Russian. Match on `code`.

use serde::Serialize;
use tracing::error;

use lowlow_core::error::FundsSource;
use lowlow_core::{CoreError, ValidationError};
use lowlow_db::DbError;

/// Error returned from every command.
///
/// ```json
/// {
///   "code": "DUPLICATE_EMAIL",
///   "message": "Пользователь с таким email уже существует"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// User-facing message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    DuplicateEmail,
    InvalidCredentials,
    NotAuthenticated,
    PermissionDenied,
    NoDefaultCard,
    InsufficientFunds,
    /// Order lifecycle or cart consistency rule.
    OrderError,
    InvalidResetCode,
    ImportError,
    DatabaseError,
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn not_authenticated() -> Self {
        ApiError::new(ErrorCode::NotAuthenticated, "Войдите в аккаунт")
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::PermissionDenied, "Недостаточно прав")
    }
}

/// Russian name of a form field.
fn field_label(field: &str) -> &str {
    match field {
        "email" => "Email",
        "password" => "Пароль",
        "nickname" => "Имя",
        "companyName" => "Название компании",
        "bin" => "БИН",
        "openingTime" => "Время открытия",
        "closingTime" => "Время закрытия",
        "cardNumber" => "Номер карты",
        "cardHolder" => "Имя владельца карты",
        "expiry" => "Срок действия",
        "cvv" => "CVV",
        "name" => "Название",
        "category" => "Категория",
        "price" => "Цена",
        "quantity" => "Количество",
        "message" => "Сообщение",
        "agreeTerms" => "Согласие с условиями",
        "amount" => "Сумма",
        other => other,
    }
}

fn validation_message(err: &ValidationError) -> String {
    match err {
        ValidationError::Required { field } => {
            format!("Поле «{}» обязательно", field_label(field))
        }
        ValidationError::TooShort { field, min } => {
            format!("{}: минимум {} символов", field_label(field), min)
        }
        ValidationError::TooLong { field, max } => {
            format!("{}: максимум {} символов", field_label(field), max)
        }
        ValidationError::OutOfRange { field, min, max } => {
            format!("{}: допустимо от {} до {}", field_label(field), min, max)
        }
        ValidationError::MustBePositive { field } => {
            format!("{}: значение должно быть больше нуля", field_label(field))
        }
        ValidationError::InvalidFormat { field, .. } => {
            format!("{}: неверный формат", field_label(field))
        }
        ValidationError::Mismatch { .. } => "Пароли не совпадают".to_string(),
        ValidationError::NotAccepted { .. } => {
            "Необходимо принять условия использования".to_string()
        }
        ValidationError::Expired { .. } => "Срок действия карты истёк".to_string(),
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => ApiError::from(core),
            DbError::NotFound { entity, id } => {
                ApiError::not_found(format!("Не найдено: {} {}", entity, id))
            }
            DbError::UniqueViolation { field, .. } => {
                error!(field = %field, "Unique constraint hit outside a checked path");
                ApiError::validation("Такая запись уже существует")
            }
            DbError::Legacy(e) => {
                error!(error = %e, "Legacy snapshot rejected");
                ApiError::new(ErrorCode::ImportError, "Не удалось прочитать файл данных")
            }
            DbError::ConnectionFailed(e) | DbError::MigrationFailed(e) => {
                error!(error = %e, "Store unavailable");
                ApiError::new(ErrorCode::DatabaseError, "Хранилище недоступно")
            }
            other => {
                error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Ошибка хранилища, попробуйте ещё раз")
            }
        }
    }
}

/// Converts domain errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UserNotFound(_) => ApiError::not_found("Пользователь не найден"),
            CoreError::OrderNotFound(_) => ApiError::not_found("Заказ не найден"),
            CoreError::CardNotFound(_) => ApiError::not_found("Карта не найдена"),
            CoreError::ProductNotFound(_) => ApiError::not_found("Товар не найден"),
            CoreError::RequestNotFound(_) => ApiError::not_found("Заявка не найдена"),
            CoreError::DuplicateEmail(_) => ApiError::new(
                ErrorCode::DuplicateEmail,
                "Пользователь с таким email уже существует",
            ),
            CoreError::InvalidCredentials => {
                ApiError::new(ErrorCode::InvalidCredentials, "Неверный email или пароль")
            }
            CoreError::NotAuthenticated => ApiError::not_authenticated(),
            CoreError::PermissionDenied { .. } => ApiError::forbidden(),
            CoreError::NoDefaultCard { .. } => {
                ApiError::new(ErrorCode::NoDefaultCard, "Добавьте карту для оплаты")
            }
            CoreError::InsufficientFunds { funds, .. } => ApiError::new(
                ErrorCode::InsufficientFunds,
                match funds {
                    FundsSource::Card => "Недостаточно средств на карте",
                    FundsSource::Account => "Недостаточно средств на балансе",
                },
            ),
            CoreError::InvalidStatusTransition { .. } => {
                ApiError::new(ErrorCode::OrderError, "Нельзя изменить статус этого заказа")
            }
            CoreError::EmptyOrder => ApiError::new(ErrorCode::OrderError, "Корзина пуста"),
            CoreError::OrderTooLarge { max } => ApiError::new(
                ErrorCode::OrderError,
                format!("В заказе может быть не больше {} позиций", max),
            ),
            CoreError::QuantityTooLarge { max, .. } => {
                ApiError::validation(format!("Количество не может превышать {}", max))
            }
            CoreError::TotalMismatch { .. } => ApiError::new(
                ErrorCode::OrderError,
                "Сумма заказа изменилась, обновите корзину",
            ),
            CoreError::PriceMismatch { .. } => ApiError::new(
                ErrorCode::OrderError,
                "Цена блюда изменилась, обновите корзину",
            ),
            CoreError::InvalidResetCode => {
                ApiError::new(ErrorCode::InvalidResetCode, "Неверный или просроченный код")
            }
            CoreError::Validation(e) => ApiError::validation(validation_message(&e)),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(validation_message(&err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_through_db_error() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientFunds {
            funds: FundsSource::Card,
            available: 100,
            required: 500,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert_eq!(err.message, "Недостаточно средств на карте");
    }

    #[test]
    fn test_validation_message_names_field() {
        let err: ApiError = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        }
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Пароль: минимум 6 символов");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_authenticated()).unwrap();
        assert_eq!(json["code"], "NOT_AUTHENTICATED");
        assert_eq!(json["message"], "Войдите в аккаунт");
    }

    #[test]
    fn test_storage_details_not_leaked() {
        let err: ApiError = DbError::QueryFailed("no such table: users".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("users"));
    }
}
