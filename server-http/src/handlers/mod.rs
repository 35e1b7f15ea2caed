pub mod assistant;
pub mod auth;
pub mod health;
pub mod maintenance;
pub mod pages;
pub mod records;
pub mod settings;

pub use assistant::ask;
pub use auth::{debug_session, login, login_page, logout};
pub use health::health_check;
pub use maintenance::{cache_stats, clear_cache};
pub use pages::{
    client_detail, clients, dashboard, occupied_rooms, reservation_detail, reservations,
};
pub use records::{
    calendar, get_client, get_reservation, system_status, update_client, update_reservation,
};
pub use settings::{save_settings, set_language, settings};
