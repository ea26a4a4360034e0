use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Config error: {0}")]
    Config(#[from] tg_config::ConfigError),

    #[error("Auth setup error: {0}")]
    Auth(#[from] tg_auth::AuthError),

    #[error("Credential store error: {0}")]
    Store(#[from] tg_store::StoreError),

    #[error("Logger error: {message}")]
    Logger { message: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
