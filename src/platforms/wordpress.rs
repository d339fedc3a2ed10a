//! WordPress/WooCommerce platform integration.
//!
//! TODO: implement the WooCommerce REST key exchange and webhook validation
//! (https://woocommerce.github.io/woocommerce-rest-api-docs/). Until then
//! every operation fails with `UnsupportedPlatform`.

use crate::error::AppError;

pub(crate) fn unsupported() -> AppError {
    AppError::UnsupportedPlatform("wordpress".to_string())
}
