use log::{debug, error, info};
use rand::Rng;
use serde_json::Value;

use crate::error::Result;
use crate::picker::pick_weighted_with;
use crate::restaurant::{
    normalize_records, parse_records, IdGenerator, Restaurant, RestaurantUpdate,
};
use crate::storage::{KeyValueStore, STORAGE_KEY};
use crate::weight::validate_weight;

///
/// The user's restaurant list, backed by a key-value store.
///
/// Every method that changes the list writes it back with [`RestaurantList::save`] before
/// returning, so the store always matches what is in memory.
///
pub struct RestaurantList<S: KeyValueStore> {
    store: S,
    restaurants: Vec<Restaurant>,
    ids: IdGenerator,
}

fn read_stored<S: KeyValueStore>(store: &S) -> Result<Option<Vec<Value>>> {
    match store.get(STORAGE_KEY)? {
        Some(stored) if !stored.trim().is_empty() => parse_records(&stored).map(Some),
        _ => Ok(None),
    }
}

impl<S: KeyValueStore> RestaurantList<S> {
    ///
    /// Reads the list from the store.
    ///
    /// This never fails: if what is stored can't be read as a list of restaurants the
    /// problem is logged and the list starts out empty.
    ///
    pub fn load(store: S) -> RestaurantList<S> {
        let mut ids = IdGenerator::default();
        let (restaurants, normalized) = match read_stored(&store) {
            Ok(Some(records)) => {
                let stored = Value::Array(records.clone());
                let restaurants = normalize_records(records, &mut ids);
                // Ids handed out here must survive to the next load
                let normalized = serde_json::to_value(&restaurants).map_or(true, |v| v != stored);
                (restaurants, normalized)
            }
            Ok(None) => {
                debug!("Nothing stored under {}", STORAGE_KEY);
                (Vec::new(), false)
            }
            Err(err) => {
                error!("Failed to parse restaurants: {}", err);
                (Vec::new(), false)
            }
        };
        info!("Loaded {} restaurants", restaurants.len());
        let mut list = RestaurantList {
            store,
            restaurants,
            ids,
        };
        if normalized {
            debug!("Stored restaurants were normalized, saving them back");
            if let Err(err) = list.save() {
                error!("Failed to save normalized restaurants: {}", err);
            }
        }
        list
    }

    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.restaurants)?;
        self.store.set(STORAGE_KEY, &json)?;
        debug!("Saved {} restaurants", self.restaurants.len());
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    pub fn enabled(&self) -> Vec<&Restaurant> {
        self.restaurants.iter().filter(|r| r.enabled).collect()
    }

    pub fn add(&mut self, name: impl Into<String>, weight: f64) -> Result<&Restaurant> {
        let weight = validate_weight(weight)?;
        let restaurant = Restaurant::new(self.ids.next_id(), name, weight);
        info!("Adding restaurant {} ({})", restaurant.id, restaurant.name);
        self.restaurants.push(restaurant);
        self.save()?;
        Ok(&self.restaurants[self.restaurants.len() - 1])
    }

    /// Returns whether a restaurant with that id existed.
    pub fn remove(&mut self, id: u64) -> Result<bool> {
        let before = self.restaurants.len();
        self.restaurants.retain(|r| r.id != id);
        if self.restaurants.len() == before {
            debug!("No restaurant {} to remove", id);
            return Ok(false);
        }
        info!("Removed restaurant {}", id);
        self.save()?;
        Ok(true)
    }

    /// Returns whether a restaurant with that id existed. Unknown ids change nothing.
    pub fn update(&mut self, id: u64, update: RestaurantUpdate) -> Result<bool> {
        if let Some(weight) = update.weight {
            validate_weight(weight)?;
        }
        let Some(restaurant) = self.restaurants.iter_mut().find(|r| r.id == id) else {
            debug!("No restaurant {} to update", id);
            return Ok(false);
        };
        update.apply(restaurant);
        debug!("Updated restaurant {}: {:?}", id, update);
        self.save()?;
        Ok(true)
    }

    pub fn set_enabled(&mut self, id: u64, enabled: bool) -> Result<bool> {
        self.update(
            id,
            RestaurantUpdate {
                enabled: Some(enabled),
                ..Default::default()
            },
        )
    }

    /// Picks among the enabled restaurants. `None` if none are enabled.
    pub fn pick(&self) -> Option<&Restaurant> {
        self.pick_with(&mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Restaurant> {
        let enabled = self.enabled();
        let picked = pick_weighted_with(&enabled, rng).copied();
        if let Some(restaurant) = picked {
            info!(
                "Picked {} ({}) out of {} enabled",
                restaurant.id,
                restaurant.name,
                enabled.len()
            );
        }
        picked
    }

    /// The whole list as indented JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.restaurants)?)
    }

    ///
    /// Replaces the list with the restaurants in `text`, which must be a JSON array.
    ///
    /// On error the current list is left alone. Returns how many restaurants were imported.
    ///
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let records = parse_records(text)?;
        self.restaurants = normalize_records(records, &mut self.ids);
        info!("Imported {} restaurants", self.restaurants.len());
        self.save()?;
        Ok(self.restaurants.len())
    }
}
