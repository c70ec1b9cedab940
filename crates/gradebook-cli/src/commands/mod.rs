pub mod init;
pub mod run;
pub mod users;
pub mod validate;
