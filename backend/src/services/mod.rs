//! Business logic services for the Branch Inventory Management Platform

pub mod auth;
pub mod branch;
pub mod category;
pub mod discrepancy;
pub mod inventory;
pub mod item;
pub mod ledger;
pub mod movement;
pub mod report;
pub mod role;
pub mod sequence;
pub mod transfer;
pub mod user;

pub use auth::AuthService;
pub use branch::BranchService;
pub use category::CategoryService;
pub use discrepancy::DiscrepancyService;
pub use inventory::InventoryService;
pub use item::ItemService;
pub use ledger::LedgerService;
pub use movement::MovementService;
pub use report::ReportService;
pub use role::RoleService;
pub use sequence::SequenceService;
pub use transfer::TransferService;
pub use user::UserService;
