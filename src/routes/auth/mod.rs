mod handler;
mod model;

pub use handler::{forgot_password, login, register, reset_password, send_otp, verify_otp};
pub use model::{Otp, Session, TEST_CODE, TEST_PHONE, User, UserResponse};
