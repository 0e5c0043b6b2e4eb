use blockling_core::CoreError;
use blockling_pool::PoolError;
use thiserror::Error;

/// Errors raised while driving a simulation session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
