mod automation_tests;
mod dashboard_tests;
mod leads_tests;
mod notifications_tests;
