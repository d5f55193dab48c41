pub mod create;
pub mod delete;
pub mod dispatch;
pub mod find;
pub mod get;
pub mod parse;
pub mod update;
pub mod validate_workspace;
