/// Animal catalog.
///
/// Catalog order is significant: an animal unlocks once the animal
/// *before* it has been found `unlock_requirement` times.
/// The first entry is always unlocked and its requirement is ignored.
///
/// Asset fields are opaque handles; the host decides what they mean.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Animal {
    pub id: &'static str,
    pub name: &'static str,
    pub image: &'static str,
    pub sound: &'static str,
    /// Terminal glyph shown when the animal is revealed.
    pub glyph: &'static str,
    pub unlock_requirement: u32,
}

impl Animal {
    pub const fn new(id: &'static str, name: &'static str, unlock_requirement: u32) -> Self {
        Animal {
            id,
            name,
            image: id,
            sound: id,
            glyph: "?",
            unlock_requirement,
        }
    }
}

const BUILTIN: [Animal; 5] = [
    Animal { id: "cow",     name: "Cow",     image: "cow-img",     sound: "cow-sound",     glyph: "🐄", unlock_requirement: 0 },
    Animal { id: "pig",     name: "Pig",     image: "pig-img",     sound: "pig-sound",     glyph: "🐖", unlock_requirement: 5 },
    Animal { id: "chicken", name: "Chicken", image: "chicken-img", sound: "chicken-sound", glyph: "🐔", unlock_requirement: 5 },
    Animal { id: "sheep",   name: "Sheep",   image: "sheep-img",   sound: "sheep-sound",   glyph: "🐑", unlock_requirement: 5 },
    Animal { id: "horse",   name: "Horse",   image: "horse-img",   sound: "horse-sound",   glyph: "🐎", unlock_requirement: 5 },
];

/// Ordered, immutable list of animals.
#[derive(Clone, Debug)]
pub struct Catalog {
    animals: Vec<Animal>,
}

impl Catalog {
    pub fn new(animals: Vec<Animal>) -> Self {
        Catalog { animals }
    }

    /// The five farm animals shipped with the game.
    pub fn builtin() -> Self {
        Catalog::new(BUILTIN.to_vec())
    }

    pub fn len(&self) -> usize {
        self.animals.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.animals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Animal> {
        self.animals.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.animals.iter().position(|a| a.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Animal> {
        self.animals.iter()
    }

    pub fn as_slice(&self) -> &[Animal] {
        &self.animals
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}
