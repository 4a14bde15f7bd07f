pub mod backend;
pub mod email;
pub mod noop;
pub mod smtp;

pub use backend::NotifyBackend;
pub use email::AdminEmail;
pub use noop::NoopBackend;
pub use smtp::SmtpMailer;
