//! Pure field extraction and normalization helpers.

pub mod email;
pub mod phone;

pub use email::{extract_all_emails, extract_email};
pub use phone::{format_phone, PhoneError};
