pub mod add_ids;
pub mod event;
pub mod generate;
pub mod init;
pub mod status;
