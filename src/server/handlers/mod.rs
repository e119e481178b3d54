// handlers module - HTTP route handlers
// Contains handlers for tree/file, backup, draft, association and health operations

pub mod associations;
pub mod backups;
pub mod drafts;
pub mod files;
pub mod health;
