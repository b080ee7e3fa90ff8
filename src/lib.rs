pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod mail;
pub mod mailbox;
pub mod service;
