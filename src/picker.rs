use log::trace;
use rand::Rng;
use serde_json::Value;

use crate::weight::{coerce_weight, finite_or_zero};

///
/// Anything the picker can choose between.
///
/// The weight is relative: an item with weight 2 is twice as likely as one with weight 1.
/// Weights that are not finite are treated as 0.
///
pub trait Candidate {
    fn weight(&self) -> f64;
}

impl<C: Candidate + ?Sized> Candidate for &C {
    fn weight(&self) -> f64 {
        (**self).weight()
    }
}

impl<T> Candidate for (T, f64) {
    fn weight(&self) -> f64 {
        self.1
    }
}

/// Loose JSON records, such as `{"name": "A", "weight": "10"}`.
impl Candidate for Value {
    fn weight(&self) -> f64 {
        self.get("weight").map_or(0.0, coerce_weight)
    }
}

fn weight_of<C: Candidate>(item: &C) -> f64 {
    finite_or_zero(item.weight())
}

pub fn total_weight<C: Candidate>(items: &[C]) -> f64 {
    items.iter().map(weight_of).sum()
}

///
/// Picks one item, biased by weight, using the thread local RNG.
///
/// Returns `None` only when `items` is empty. If the weights add up to nothing
/// (all zero, all garbage, or negatives cancelling out) every item is equally likely.
///
pub fn pick_weighted<C: Candidate>(items: &[C]) -> Option<&C> {
    pick_weighted_with(items, &mut rand::thread_rng())
}

/// As [`pick_weighted`], treating a missing list like an empty one.
pub fn pick_weighted_opt<C: Candidate>(items: Option<&[C]>) -> Option<&C> {
    items.and_then(pick_weighted)
}

pub fn pick_weighted_with<'a, C: Candidate, R: Rng + ?Sized>(
    items: &'a [C],
    rng: &mut R,
) -> Option<&'a C> {
    if items.is_empty() {
        return None;
    }
    let total_weight = total_weight(items);
    let index = if total_weight <= 0.0 {
        trace!(
            "Total weight {} is not positive, picking uniformly from {} items",
            total_weight,
            items.len()
        );
        rng.gen_range(0..items.len())
    } else {
        locate(items, rng.gen::<f64>() * total_weight)
    };
    items.get(index)
}

///
/// Walks the items in order, subtracting each weight from `target` until it falls inside one.
///
/// If the walk runs off the end (which only floating point rounding at `target == total` can
/// cause) the last index is returned.
///
pub fn locate<C: Candidate>(items: &[C], target: f64) -> usize {
    let mut remaining = target;
    for (index, item) in items.iter().enumerate() {
        let weight = weight_of(item);
        if remaining < weight {
            return index;
        }
        remaining -= weight;
    }
    items.len().saturating_sub(1)
}
