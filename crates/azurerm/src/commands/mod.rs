pub mod create;
pub mod delete;
pub mod plan;
pub mod read;
pub mod register;
pub mod state;
pub mod update;
pub mod validate;
