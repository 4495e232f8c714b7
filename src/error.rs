use crate::mi::record::Token;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- backend errors --------------------------------------------
    #[error("{0}")]
    Backend(String),
    #[error("result record has no `{0}` field")]
    MissingField(&'static str),

    // --------------------------------- session errors --------------------------------------------
    #[error("debugger session closed")]
    SessionClosed,
    #[error("no result for command {0} in time")]
    Timeout(Token),
    #[error(transparent)]
    IO(#[from] std::io::Error),

    // --------------------------------- variable object errors ------------------------------------
    #[error("variable object `{0}` not found")]
    VarNotFound(String),
    #[error("unknown variable reference {0}")]
    UnknownReference(u32),
    #[error("unknown display format `{0}`")]
    UnknownFormat(String),
    #[error("no free variable reference numbers left")]
    ReferencesExhausted,
}

impl Error {
    /// Return a hint to an interface - continue the session after error or stop it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Backend(_) => false,
            Error::MissingField(_) => false,
            Error::Timeout(_) => false,
            Error::VarNotFound(_) => false,
            Error::UnknownReference(_) => false,
            Error::UnknownFormat(_) => false,
            Error::ReferencesExhausted => false,

            Error::SessionClosed => true,
            Error::IO(_) => true,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "session", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "session", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
