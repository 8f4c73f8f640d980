pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod memory;
pub mod slots;
pub mod store;
pub mod supabase;

pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
pub use memory::InMemoryAppointmentStore;
pub use slots::{slots_for_day, weekdays_in_range, SlotSearch, SlotService};
pub use store::{AppointmentChanges, AppointmentStore, NewAppointment};
pub use supabase::SupabaseAppointmentStore;
