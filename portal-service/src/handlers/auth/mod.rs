pub mod password;
pub mod registration;
pub mod session;

pub use password::{forgot_password, reset_password, verify_code};
pub use registration::{police_register, register};
pub use session::{login, logout, me, police_login};
