pub mod jwt;

pub use jwt::{DecodeError, IdentityToken, JwtDecoder, TokenDecoder};
