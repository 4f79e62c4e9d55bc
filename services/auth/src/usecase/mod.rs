pub mod credential;
pub mod login;
pub mod otp;
pub mod session;
