mod errno;
mod error;

pub use self::errno::Errno;
pub use self::errno::Errno::*;
pub use self::error::{Error, ErrorLocation};

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! errno {
    ($errno_expr:expr, $error_msg:expr) => {{
        let inner_error = {
            let errno: crate::error::Errno = $errno_expr;
            let msg: &'static str = $error_msg;
            (errno, msg)
        };
        crate::error::Error::new(
            inner_error,
            Some(crate::error::ErrorLocation::new(file!(), line!())),
        )
    }};
}

macro_rules! return_errno {
    ($errno_expr:expr, $error_msg:expr) => {{
        return Err(errno!($errno_expr, $error_msg));
    }};
}
