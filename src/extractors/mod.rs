pub mod token;

pub use token::AuthToken;
