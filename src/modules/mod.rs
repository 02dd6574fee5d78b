//! Blog site module layout
//!
//! Core configuration and tools
pub mod config;
pub mod cli;
pub mod error;

// Persistence
pub mod database {
    pub mod storage;
    pub mod comments;
    pub mod sessions;
}

// Accounts, sessions and flash notices
pub mod auth {
    pub mod password;
    pub mod session;
    pub mod flash;
}

// Page rendering
pub mod content {
    pub mod templates;
}

// Outgoing mail
pub mod mail {
    pub mod contact;
}

// Web layer
pub mod web {
    pub mod context;
    pub mod forms;
    pub mod routes;
    pub mod admin;
}
