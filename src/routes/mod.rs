pub mod backups;
pub mod health;
pub mod history;
pub mod search;
pub mod sky;
