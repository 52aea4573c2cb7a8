//! Domain types shared across the Bloomery client.
//!
//! All wire types serialize to/from the backend's camelCase JSON.

pub mod announcement;
pub mod background;
pub mod hero;
pub mod id;
pub mod price;
pub mod settings;

pub use announcement::{Announcement, Platform};
pub use background::Background;
pub use hero::{Hero, HeroUpdate};
pub use id::{AnnouncementId, BackgroundId, HeroId};
pub use price::{CurrencyCode, Price};
pub use settings::{SettingsGroup, SettingsPatch, StoreSettings};
