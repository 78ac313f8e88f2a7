use im::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::hash::{DEFAULT_HASH_SEED, FnvBuildHasher, FnvHasher};
use crate::kind::Kind;
use crate::variant::Variant;

/// Unordered collection of distinct variants.
///
/// Members are bucketed by their kind-canonical hash (see the `Hash` impl
/// on [`Variant`]) and compared with promotion, so `1` and `1.0` are the
/// same member. Iteration order is fixed for a given set of members.
#[derive(Clone)]
pub struct Set {
    members: HashSet<Variant, FnvBuildHasher>,
}

impl Set {
    pub fn new() -> Self {
        Self {
            members: HashSet::with_hasher(FnvBuildHasher::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert `value`; returns false when an equal member was already present
    pub fn insert(&mut self, value: Variant) -> bool {
        if self.members.contains(&value) {
            return false;
        }
        self.members.insert(value);
        true
    }

    pub fn remove(&mut self, value: &Variant) -> bool {
        self.members.remove(value).is_some()
    }

    pub fn contains(&self, value: &Variant) -> bool {
        self.members.contains(value)
    }

    pub fn iter(&self) -> im::hashset::Iter<'_, Variant> {
        self.members.iter()
    }

    pub fn union(&self, other: &Set) -> Set {
        let mut result = self.clone();
        for member in other.iter() {
            result.insert(member.clone());
        }
        result
    }

    pub fn intersection(&self, other: &Set) -> Set {
        self.iter()
            .filter(|member| other.contains(member))
            .cloned()
            .collect()
    }

    /// Members of `self` that are not in `other`
    pub fn difference(&self, other: &Set) -> Set {
        self.iter()
            .filter(|member| !other.contains(member))
            .cloned()
            .collect()
    }

    /// Order-independent seeded hash: members are combined with XOR
    pub fn hash_with_seed(&self, seed: u64) -> u64 {
        let combined = self
            .iter()
            .fold(0u64, |acc, member| acc ^ member.canonical_hash(seed));

        let mut hasher = FnvHasher::with_seed(seed);
        hasher.write_u8(Kind::Set.tag());
        hasher.write_u64(self.len() as u64);
        hasher.write_u64(combined);
        hasher.finish()
    }
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|member| other.contains(member))
    }
}

impl Eq for Set {}

impl Hash for Set {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self
            .iter()
            .fold(0u64, |acc, member| acc ^ member.canonical_hash(DEFAULT_HASH_SEED));
        state.write_usize(self.len());
        state.write_u64(combined);
    }
}

impl FromIterator<Variant> for Set {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut set = Set::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a Variant;
    type IntoIter = im::hashset::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, member) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "}}")
    }
}
