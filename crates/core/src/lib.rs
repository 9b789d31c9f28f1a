pub mod answers;
pub mod dialogue;
pub mod draft;
pub mod edit;
pub mod error;
pub mod naming;
pub mod options;
pub mod ports;
pub mod power;
pub mod prompt;
pub mod sfx;
pub mod submission;
pub mod types;
pub mod validation;
