pub mod login;
pub mod project;
pub mod usecase;

pub use login::{LoginFlow, LoginOutcome, Notice, NoticeLevel};
pub use project::{GridRow, Generated, ProjectFlow, ProjectSummary};
pub use usecase::{EventListDetail, UsecaseFlow};
