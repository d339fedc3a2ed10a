//! Zid platform integration.
//!
//! TODO: implement the Zid OAuth flow and webhook validation
//! (https://docs.zid.sa/). Until then every operation fails with
//! `UnsupportedPlatform` so operators can tell "not implemented" apart from
//! a transient upstream failure.

use crate::error::AppError;

pub(crate) fn unsupported() -> AppError {
    AppError::UnsupportedPlatform("zid".to_string())
}
