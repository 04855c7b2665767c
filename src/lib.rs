pub mod error;
pub mod picker;
pub mod restaurant;
pub mod restaurants;
pub mod storage;
pub mod transfer;
pub mod weight;

pub use error::{Error, Result};
pub use picker::{pick_weighted, pick_weighted_with, Candidate};
pub use restaurant::{Restaurant, RestaurantUpdate};
pub use restaurants::RestaurantList;
pub use storage::{FileStore, KeyValueStore, MemoryStore, STORAGE_KEY};
