//! Named model-parameter dictionaries and override merging.
//!
//! Each empirical model (MAH, efficiency, quenching) exposes its parameters
//! as an ordered set of named `f64` values through the [`ParamSet`] trait.
//! Callers customize a run by supplying [`Overrides`]; the merge routine
//! routes each override to the one dictionary that owns the key.
//!
//! Validation rules:
//! - an override key recognized by no dictionary is an error (no silent
//!   ignore, no partial application)
//! - a key defined by more than one dictionary is rejected outright, before
//!   any override is applied — collisions make routing ambiguous, so they are
//!   refused rather than resolved by precedence
//! - override values must be finite

use crate::error::AppError;

/// Insertion-ordered caller overrides for model parameters.
///
/// Order matters only for deterministic error messages; if the same key is
/// supplied twice the later value wins.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: Vec<(String, f64)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an override.
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder-style `set`, convenient in call sites and tests.
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// An ordered, named dictionary of `f64` model parameters.
pub trait ParamSet {
    /// Short model name used in error messages and diagnostics.
    fn model_name(&self) -> &'static str;

    /// Parameter names in their canonical order.
    fn keys(&self) -> &'static [&'static str];

    /// Look up one parameter by name.
    fn get(&self, key: &str) -> Option<f64>;

    /// Set one parameter by name; returns false if the key is unknown.
    fn set(&mut self, key: &str, value: f64) -> bool;
}

/// Apply caller overrides across several default dictionaries.
///
/// The dictionaries are mutated in place; on error nothing useful can be
/// assumed about them (callers treat any error as fatal for the run).
pub fn merge_with_validation(
    sets: &mut [&mut dyn ParamSet],
    overrides: &Overrides,
) -> Result<(), AppError> {
    // Reject cross-dictionary key collisions up front.
    for (i, a) in sets.iter().enumerate() {
        for b in sets.iter().skip(i + 1) {
            for key in a.keys() {
                if b.keys().contains(key) {
                    return Err(AppError::new(
                        2,
                        format!(
                            "Ambiguous parameter dictionaries: key '{key}' is defined by both {} and {}.",
                            a.model_name(),
                            b.model_name()
                        ),
                    ));
                }
            }
        }
    }

    for (key, value) in overrides.iter() {
        if !value.is_finite() {
            return Err(AppError::new(2, format!("Non-finite value for parameter '{key}'.")));
        }
        let mut applied = false;
        for set in sets.iter_mut() {
            if set.set(key, value) {
                applied = true;
                break;
            }
        }
        if !applied {
            return Err(AppError::new(2, format!("Unrecognized model parameter '{key}'.")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DictAb {
        a: f64,
        b: f64,
    }

    struct DictCd {
        c: f64,
        d: f64,
    }

    // A deliberately colliding dictionary (shares 'a' with DictAb).
    struct DictAd {
        a: f64,
        d: f64,
    }

    impl ParamSet for DictAb {
        fn model_name(&self) -> &'static str {
            "ab"
        }
        fn keys(&self) -> &'static [&'static str] {
            &["a", "b"]
        }
        fn get(&self, key: &str) -> Option<f64> {
            match key {
                "a" => Some(self.a),
                "b" => Some(self.b),
                _ => None,
            }
        }
        fn set(&mut self, key: &str, value: f64) -> bool {
            match key {
                "a" => self.a = value,
                "b" => self.b = value,
                _ => return false,
            }
            true
        }
    }

    impl ParamSet for DictCd {
        fn model_name(&self) -> &'static str {
            "cd"
        }
        fn keys(&self) -> &'static [&'static str] {
            &["c", "d"]
        }
        fn get(&self, key: &str) -> Option<f64> {
            match key {
                "c" => Some(self.c),
                "d" => Some(self.d),
                _ => None,
            }
        }
        fn set(&mut self, key: &str, value: f64) -> bool {
            match key {
                "c" => self.c = value,
                "d" => self.d = value,
                _ => return false,
            }
            true
        }
    }

    impl ParamSet for DictAd {
        fn model_name(&self) -> &'static str {
            "ad"
        }
        fn keys(&self) -> &'static [&'static str] {
            &["a", "d"]
        }
        fn get(&self, key: &str) -> Option<f64> {
            match key {
                "a" => Some(self.a),
                "d" => Some(self.d),
                _ => None,
            }
        }
        fn set(&mut self, key: &str, value: f64) -> bool {
            match key {
                "a" => self.a = value,
                "d" => self.d = value,
                _ => return false,
            }
            true
        }
    }

    #[test]
    fn merge_updates_only_the_owning_dictionary() {
        let mut ab = DictAb { a: 1.0, b: 2.0 };
        let mut cd = DictCd { c: 3.0, d: 4.0 };
        let overrides = Overrides::new().with("a", 2.0);

        merge_with_validation(&mut [&mut ab, &mut cd], &overrides).unwrap();
        assert_eq!(ab.a, 2.0);
        assert_eq!(ab.b, 2.0);
        assert_eq!(cd.c, 3.0);
        assert_eq!(cd.d, 4.0);
    }

    #[test]
    fn merge_reaches_the_second_dictionary() {
        let mut ab = DictAb { a: 1.0, b: 2.0 };
        let mut cd = DictCd { c: 3.0, d: 4.0 };
        let overrides = Overrides::new().with("c", 4.0);

        merge_with_validation(&mut [&mut ab, &mut cd], &overrides).unwrap();
        assert_eq!(ab.a, 1.0);
        assert_eq!(cd.c, 4.0);
        assert_eq!(cd.d, 4.0);
    }

    #[test]
    fn merge_rejects_unknown_keys() {
        let mut ab = DictAb { a: 1.0, b: 2.0 };
        let mut cd = DictCd { c: 3.0, d: 4.0 };
        let overrides = Overrides::new().with("e", 5.0);

        let err = merge_with_validation(&mut [&mut ab, &mut cd], &overrides).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("'e'"), "message should name the key: {err}");
    }

    #[test]
    fn merge_rejects_overlapping_dictionaries() {
        // 'a' is defined by both dictionaries; the merge must refuse even
        // though the override itself ('d') is unambiguous.
        let mut ab = DictAb { a: 1.0, b: 2.0 };
        let mut ad = DictAd { a: 3.0, d: 4.0 };
        let overrides = Overrides::new().with("d", 5.0);

        let err = merge_with_validation(&mut [&mut ab, &mut ad], &overrides).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("'a'"), "message should name the colliding key: {err}");
    }

    #[test]
    fn merge_rejects_non_finite_values() {
        let mut ab = DictAb { a: 1.0, b: 2.0 };
        let overrides = Overrides::new().with("a", f64::NAN);
        assert!(merge_with_validation(&mut [&mut ab], &overrides).is_err());
    }

    #[test]
    fn overrides_later_value_wins() {
        let o = Overrides::new().with("a", 1.0).with("a", 7.0);
        let collected: Vec<_> = o.iter().collect();
        assert_eq!(collected, vec![("a", 7.0)]);
    }
}
