pub mod dashboard;
pub mod home;

pub use dashboard::{dashboard_page, DashboardVm};
pub use home::home_page;
