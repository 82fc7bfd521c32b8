pub mod jwt;
pub mod money;
pub mod password;
pub mod token;
pub mod validate;
