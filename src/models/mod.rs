mod package;
mod platform;
mod store;
mod subscription;
mod subscription_history;
mod user;
mod webhook_log;

pub use package::*;
pub use platform::*;
pub use store::*;
pub use subscription::*;
pub use subscription_history::*;
pub use user::*;
pub use webhook_log::*;
