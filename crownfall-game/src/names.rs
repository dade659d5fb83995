//! Display names for characters.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::pieces::{Gender, PlayerId};

/// Produces an opaque display label for a newly created character.
pub trait NameGenerator {
    fn generate_name(&mut self, gender: Gender, house: PlayerId) -> String;
}

const MALE_NAMES: &[&str] = &[
    "Aldric", "Baldwin", "Cedric", "Desmond", "Edmund", "Fulk", "Godfrey", "Harold", "Ivo",
    "Jasper", "Leofric", "Magnus", "Odo", "Percival", "Roland", "Stephen", "Tristan", "Walter",
];

const FEMALE_NAMES: &[&str] = &[
    "Adela", "Beatrice", "Cecily", "Edith", "Eleanor", "Gisela", "Helewise", "Isolde", "Joan",
    "Katherine", "Matilda", "Maud", "Petronilla", "Rohesia", "Sibyl", "Yolande",
];

/// Houses are named after the seat colours of the table.
const HOUSES: &[&str] = &[
    "Red", "Blue", "Green", "Yellow", "Orange", "Purple", "Black", "White",
];

/// Samples given names from built-in lists and appends the player's house.
#[derive(Debug, Clone)]
pub struct ListNameGenerator<R> {
    rng: R,
}

impl<R: Rng> ListNameGenerator<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

/// Name of a player's house.
#[must_use]
pub fn house_name(house: PlayerId) -> &'static str {
    HOUSES[house.index() % HOUSES.len()]
}

impl<R: Rng> NameGenerator for ListNameGenerator<R> {
    fn generate_name(&mut self, gender: Gender, house: PlayerId) -> String {
        let pool = match gender {
            Gender::Male => MALE_NAMES,
            Gender::Female => FEMALE_NAMES,
        };
        let given = pool.choose(&mut self.rng).copied().unwrap_or("Nameless");
        format!("{given} {}", house_name(house))
    }
}
