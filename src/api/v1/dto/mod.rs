pub mod users;
pub mod whoami;
