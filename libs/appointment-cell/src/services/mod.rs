pub mod booking;
pub mod lifecycle;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
