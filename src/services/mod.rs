pub mod absence_scheduler;
pub mod attendance_service;
pub mod conflict_checker;
pub mod error;
pub mod schedule_service;
