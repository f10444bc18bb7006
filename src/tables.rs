pub mod programme;
pub mod signup_extra;
