pub mod auth;
pub mod background;
pub mod dao;
pub mod quota;

pub use auth::AuthService;
pub use background::AutoResetService;
pub use dao::*;
pub use quota::QuotaGuard;
