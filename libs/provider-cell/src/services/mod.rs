pub mod directory;
pub mod memory;
pub mod schedule;
pub mod seed;
pub mod supabase;

pub use directory::{select_active_schedule, ProviderDirectory};
pub use memory::InMemoryDirectory;
pub use schedule::ScheduleService;
pub use seed::seed_demo_data;
pub use supabase::SupabaseProviderDirectory;
