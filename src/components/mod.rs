// Export components
pub mod display;
pub mod google_calendar;

// Re-export the two entry points
pub use display::Display;
pub use google_calendar::GoogleCalendar;
