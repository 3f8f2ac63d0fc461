pub mod accounts;
pub mod health;
pub mod projects;
pub mod usecases;
