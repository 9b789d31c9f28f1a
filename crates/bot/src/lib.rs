pub mod admin;
pub mod config;
pub mod dispatcher;
pub mod docx;
pub mod documents;
pub mod edit;
pub mod error;
pub mod event;
pub mod menu;
pub mod poller;
pub mod routes;
pub mod session;
pub mod state;
pub mod survey;
pub mod telegram;
pub mod tokens;
