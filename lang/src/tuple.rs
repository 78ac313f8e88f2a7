use im::Vector;
use std::fmt;
use std::hash::Hasher;

use crate::error::{ValueError, ValueResult};
use crate::hash::{FnvHasher, position_perturbation};
use crate::kind::Kind;
use crate::variant::Variant;

/// Ordered, 1-based sequence of variants.
///
/// Backed by a persistent vector: clones share structure and an update only
/// copies the path it touches, so the observable behavior is that of a deep
/// copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tuple {
    elements: Vector<Variant>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a string: a tuple of Unicode code points
    pub fn from_text(text: &str) -> Self {
        text.chars()
            .map(|c| Variant::Integer(i64::from(u32::from(c))))
            .collect()
    }

    /// Read the tuple back as a string
    pub fn to_text(&self) -> ValueResult<String> {
        self.elements
            .iter()
            .map(|element| {
                let code = element
                    .to_integer()
                    .ok_or(ValueError::CanNotConvertToString {
                        kind: element.kind(),
                    })?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| ValueError::MalformedString {
                        reason: format!("{code} is not a Unicode code point"),
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> im::vector::Iter<'_, Variant> {
        self.elements.iter()
    }

    fn offset(&self, index: i64) -> ValueResult<usize> {
        if index < 1 || index as u64 > self.len() as u64 {
            return Err(ValueError::InvalidIndex {
                index,
                length: self.len(),
            });
        }
        Ok((index - 1) as usize)
    }

    /// Element at a 1-based position
    pub fn at(&self, index: i64) -> ValueResult<&Variant> {
        let offset = self.offset(index)?;
        self.elements.get(offset).ok_or(ValueError::InvalidIndex {
            index,
            length: self.len(),
        })
    }

    /// Replace the element at `index`, or append when `index` is one past
    /// the end
    pub fn update(&mut self, index: i64, value: Variant) -> ValueResult<()> {
        if index >= 1 && index as u64 == self.len() as u64 + 1 {
            self.elements.push_back(value);
            return Ok(());
        }
        let offset = self.offset(index)?;
        self.elements.set(offset, value);
        Ok(())
    }

    pub fn push(&mut self, value: Variant) {
        self.elements.push_back(value);
    }

    /// `self ++ other`, order preserved
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut elements = self.elements.clone();
        elements.append(other.elements.clone());
        Tuple { elements }
    }

    /// Undo a concatenation: strip `suffix` from the end, so that
    /// `a.concat(b).split(b) == a`
    pub fn split(&self, suffix: &Tuple) -> ValueResult<Tuple> {
        if suffix.len() > self.len() {
            return Err(ValueError::invalid_parameter(format!(
                "tuple of {} elements can not be divided by a tuple of {}",
                self.len(),
                suffix.len()
            )));
        }
        let keep = self.len() - suffix.len();
        let tail = self.elements.clone().slice(keep..);
        if tail != suffix.elements {
            return Err(ValueError::invalid_parameter(
                "tuple does not end with the divisor",
            ));
        }
        Ok(Tuple {
            elements: self.elements.clone().slice(..keep),
        })
    }

    /// Position-dependent seeded hash
    pub fn hash_with_seed(&self, seed: u64) -> u64 {
        let mut hasher = FnvHasher::with_seed(seed);
        hasher.write_u8(Kind::Tuple.tag());
        hasher.write_u64(self.len() as u64);
        for (position, element) in self.elements.iter().enumerate() {
            hasher.write_u64(element.canonical_hash(seed) ^ position_perturbation(seed, position));
        }
        hasher.finish()
    }
}

impl From<Vec<Variant>> for Tuple {
    fn from(elements: Vec<Variant>) -> Self {
        Tuple {
            elements: Vector::from(elements),
        }
    }
}

impl FromIterator<Variant> for Tuple {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Tuple {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Variant;
    type IntoIter = im::vector::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Tuple {
        values.iter().map(|&v| Variant::Integer(v)).collect()
    }

    #[test]
    fn at_is_one_based() {
        let t = ints(&[10, 20, 30]);
        assert_eq!(t.at(1), Ok(&Variant::Integer(10)));
        assert_eq!(t.at(3), Ok(&Variant::Integer(30)));
        assert_eq!(
            t.at(0),
            Err(ValueError::InvalidIndex {
                index: 0,
                length: 3
            })
        );
        assert_eq!(
            t.at(4),
            Err(ValueError::InvalidIndex {
                index: 4,
                length: 3
            })
        );
    }

    #[test]
    fn update_replaces_or_appends() {
        let mut t = ints(&[1, 2]);
        t.update(1, Variant::Real(1.5)).unwrap();
        t.update(3, Variant::Boolean(true)).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.at(1), Ok(&Variant::Real(1.5)));
        assert_eq!(t.at(3), Ok(&Variant::Boolean(true)));
        assert!(t.update(5, Variant::None).is_err());
    }

    #[test]
    fn update_does_not_leak_into_clone() {
        let original = ints(&[1, 2, 3]);
        let mut copy = original.clone();
        copy.update(2, Variant::Integer(99)).unwrap();

        assert_eq!(original.at(2), Ok(&Variant::Integer(2)));
        assert_eq!(copy.at(2), Ok(&Variant::Integer(99)));
    }

    #[test]
    fn concat_then_split_is_identity() {
        let a = ints(&[1, 2, 3]);
        let b = ints(&[1, 2]);
        let ab = a.concat(&b);

        assert_eq!(ab, ints(&[1, 2, 3, 1, 2]));
        assert_eq!(ab.split(&b), Ok(a.clone()));
        assert!(matches!(
            a.split(&b),
            Err(ValueError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn split_by_empty_and_longer() {
        let a = ints(&[4, 5]);
        assert_eq!(a.split(&Tuple::new()), Ok(a.clone()));
        assert!(a.split(&ints(&[1, 4, 5])).is_err());
    }

    #[test]
    fn equality_promotes_elements() {
        let a = ints(&[1, 2]);
        let b = Tuple::from(vec![Variant::Real(1.0), Variant::Integer(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn text_round_trip() {
        let t = Tuple::from_text("héllo");
        assert_eq!(t.len(), 5);
        assert_eq!(t.at(2), Ok(&Variant::Integer(0xe9)));
        assert_eq!(t.to_text(), Ok("héllo".to_string()));
    }

    #[test]
    fn text_rejects_bad_code_points() {
        let t = Tuple::from(vec![Variant::Integer(0xD800)]);
        assert!(matches!(
            t.to_text(),
            Err(ValueError::MalformedString { .. })
        ));

        let t = Tuple::from(vec![Variant::Real(65.5)]);
        assert_eq!(
            t.to_text(),
            Err(ValueError::CanNotConvertToString { kind: Kind::Real })
        );
    }

    #[test]
    fn hash_is_position_dependent() {
        let a = ints(&[1, 2]);
        let b = ints(&[2, 1]);
        assert_ne!(a.hash_with_seed(0), b.hash_with_seed(0));
        assert_eq!(a.hash_with_seed(11), ints(&[1, 2]).hash_with_seed(11));
    }

    #[test]
    fn equal_tuples_of_different_element_kinds_hash_alike() {
        let a = ints(&[1, 2]);
        let b = Tuple::from(vec![Variant::Real(1.0), Variant::Boolean(false)]);
        let c = Tuple::from(vec![Variant::Real(1.0), Variant::Real(2.0)]);
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.hash_with_seed(11), c.hash_with_seed(11));
        assert_eq!(a.hash_with_seed(0), c.hash_with_seed(0));
    }

    #[test]
    fn display() {
        let t = Tuple::from(vec![Variant::Integer(1), Variant::Boolean(false)]);
        assert_eq!(t.to_string(), "(1, false)");
    }
}
