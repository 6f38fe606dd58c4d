// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Band Keys and Ordered Band Maps
// ─────────────────────────────────────────────────────────────────────
//! Spectral bands are addressed by [`BandKey`]: either a named band
//! (`"low"`, `"high"`, `"key-003"`, ...) or the sum of several named
//! bands. Labels are rendered as text for downstream consumers:
//!
//! - named band: `alpha`
//! - combination: `(beta_and_gamma)`
//! - ratio: `alpha_over_(beta_and_gamma)`

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one spectral band.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandKey {
    Named(String),
    /// Sum of the listed bands, in band-map order.
    Combination(Vec<String>),
}

impl BandKey {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn combination<S: AsRef<str>>(names: &[S]) -> Self {
        Self::Combination(names.iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// True if the band is `name` or a combination including `name`.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Named(n) => n == name,
            Self::Combination(parts) => parts.iter().any(|p| p == name),
        }
    }

    /// Name of a plain band, `None` for combinations.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(n) => Some(n),
            Self::Combination(_) => None,
        }
    }
}

impl fmt::Display for BandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::Combination(parts) => write!(f, "({})", parts.join("_and_")),
        }
    }
}

impl From<&str> for BandKey {
    fn from(s: &str) -> Self {
        Self::Named(s.to_string())
    }
}

impl From<String> for BandKey {
    fn from(s: String) -> Self {
        Self::Named(s)
    }
}

/// Numerator/denominator pair of a generalised SDI entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatioKey {
    pub numerator: BandKey,
    pub denominator: BandKey,
}

impl RatioKey {
    pub fn new(numerator: BandKey, denominator: BandKey) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl fmt::Display for RatioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_over_{}", self.numerator, self.denominator)
    }
}

/// Insertion-ordered map with textual label lookup.
///
/// Band counts are small (a handful of entries), so lookups are linear.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq + fmt::Display, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; replacing keeps the original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Lookup by rendered label (e.g. `"(alpha_and_beta)"`).
    pub fn get_label(&self, label: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k.to_string() == label)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same keys, transformed values.
    pub fn map_values<U>(&self, mut f: impl FnMut(&K, &V) -> U) -> OrderedMap<K, U>
    where
        K: Clone,
    {
        OrderedMap {
            entries: self.entries.iter().map(|(k, v)| (k.clone(), f(k, v))).collect(),
        }
    }

    /// Fallible variant of [`OrderedMap::map_values`].
    pub fn try_map_values<U, E>(
        &self,
        mut f: impl FnMut(&K, &V) -> Result<U, E>,
    ) -> Result<OrderedMap<K, U>, E>
    where
        K: Clone,
    {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (k, v) in &self.entries {
            entries.push((k.clone(), f(k, v)?));
        }
        Ok(OrderedMap { entries })
    }
}

impl<K: PartialEq + fmt::Display, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Per-band values (split eigenvectors, split timeseries, FC, ...).
pub type BandMap<V> = OrderedMap<BandKey, V>;

/// Generalised SDI entries keyed by ratio.
pub type RatioMap<V> = OrderedMap<RatioKey, V>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_label() {
        let key = BandKey::combination(&["beta", "gamma"]);
        assert_eq!(key.to_string(), "(beta_and_gamma)");
        assert!(key.contains("gamma"));
        assert!(!key.contains("alpha"));
    }

    #[test]
    fn test_ratio_label() {
        let key = RatioKey::new(
            BandKey::named("alpha"),
            BandKey::combination(&["beta", "gamma"]),
        );
        assert_eq!(key.to_string(), "alpha_over_(beta_and_gamma)");
    }

    #[test]
    fn test_membership_is_structural() {
        // "low" must not match "lower" the way a substring test would.
        let key = BandKey::named("lower");
        assert!(!key.contains("low"));
    }

    #[test]
    fn test_ordered_map_keeps_insertion_order() {
        let mut map: BandMap<u32> = BandMap::new();
        map.insert("high".into(), 2);
        map.insert("low".into(), 1);
        assert_eq!(map.labels(), vec!["high", "low"]);
        assert_eq!(map.insert("high".into(), 5), Some(2));
        assert_eq!(map.labels(), vec!["high", "low"]);
        assert_eq!(map.get_label("high"), Some(&5));
    }

    #[test]
    fn test_try_map_values_short_circuits() {
        let map: BandMap<i32> = vec![("a".into(), 1), ("b".into(), -1)]
            .into_iter()
            .collect();
        let out: Result<BandMap<i32>, String> = map.try_map_values(|_, v| {
            if *v < 0 {
                Err("negative".to_string())
            } else {
                Ok(v * 2)
            }
        });
        assert!(out.is_err());
    }
}
