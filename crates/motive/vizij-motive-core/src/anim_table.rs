//! Resolution table: (object, action) -> ordered curve handles.
//!
//! The serialized table only names curves; bytes are decoded and curves are
//! fetched by a [`CurveLoader`] supplied by the host. Loading is
//! load-once-by-name: every entry naming the same curve shares one
//! [`CurveHandle`].

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::MotiveError;
use crate::spline::{parse_spline_json, Spline1f};

/// Leading tag of a serialized table.
pub const ANIM_TABLE_IDENTIFIER: &[u8; 4] = b"ANTB";

/// File extension of serialized tables.
pub const ANIM_TABLE_EXTENSION: &str = "motivetable";

/// Shared, immutable curve resource.
pub type CurveHandle = Arc<Spline1f>;

/// True iff `bytes` starts with [`ANIM_TABLE_IDENTIFIER`].
pub fn has_anim_table_identifier(bytes: &[u8]) -> bool {
    bytes.starts_with(ANIM_TABLE_IDENTIFIER)
}

/// Fails with [`MotiveError::MissingIdentifier`] unless `bytes` is tagged as a table.
pub fn check_anim_table_identifier(bytes: &[u8]) -> Result<(), MotiveError> {
    if has_anim_table_identifier(bytes) {
        Ok(())
    } else {
        Err(MotiveError::MissingIdentifier)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimActionDef {
    #[serde(default)]
    pub curves: Vec<String>,
}

/// Actions of one object category, indexed by action index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimListDef {
    #[serde(default)]
    pub actions: Vec<AnimActionDef>,
}

/// Object categories, indexed by object index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimTableDef {
    #[serde(default)]
    pub objects: Vec<AnimListDef>,
}

impl AnimTableDef {
    /// Distinct curve names in first-seen order.
    pub fn curve_names(&self) -> Vec<&str> {
        let mut seen = hashbrown::HashSet::new();
        self.objects
            .iter()
            .flat_map(|o| o.actions.iter())
            .flat_map(|a| a.curves.iter())
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// Parse a table definition from JSON.
pub fn parse_anim_table_json(s: &str) -> Result<AnimTableDef, MotiveError> {
    Ok(serde_json::from_str(s)?)
}

/// Host-supplied curve source.
pub trait CurveLoader {
    fn load_curve(&mut self, name: &str) -> Result<Spline1f, MotiveError>;
}

/// Curves held in memory, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MapCurveLoader {
    curves: HashMap<String, Spline1f>,
}

impl MapCurveLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, curve: Spline1f) {
        self.curves.insert(name.into(), curve);
    }

    /// Parse and insert a JSON curve asset.
    pub fn insert_json(&mut self, name: impl Into<String>, json: &str) -> Result<(), MotiveError> {
        let curve = parse_spline_json(json)?;
        self.insert(name, curve);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

impl CurveLoader for MapCurveLoader {
    fn load_curve(&mut self, name: &str) -> Result<Spline1f, MotiveError> {
        self.curves
            .get(name)
            .cloned()
            .ok_or_else(|| MotiveError::CurveLoad {
                name: name.to_string(),
                reason: "not found".into(),
            })
    }
}

/// A table with every curve it names loaded.
#[derive(Clone, Debug, Default)]
pub struct AnimTable {
    def: AnimTableDef,
    curves: HashMap<String, CurveHandle>,
    failed: Vec<String>,
}

impl AnimTable {
    /// Load every distinct curve in `def` once.
    ///
    /// Curves the loader cannot supply are skipped with a warning and left
    /// out of resolved lists; see [`AnimTable::failed_curves`].
    pub fn load(def: AnimTableDef, loader: &mut impl CurveLoader) -> Self {
        let mut curves = HashMap::new();
        let mut failed = Vec::new();
        for name in def.curve_names() {
            match loader.load_curve(name) {
                Ok(curve) => {
                    curves.insert(name.to_string(), Arc::new(curve));
                }
                Err(err) => {
                    log::warn!("anim table: {err}");
                    failed.push(name.to_string());
                }
            }
        }
        Self {
            def,
            curves,
            failed,
        }
    }

    /// Parse `json` and load its curves.
    pub fn from_json(json: &str, loader: &mut impl CurveLoader) -> Result<Self, MotiveError> {
        Ok(Self::load(parse_anim_table_json(json)?, loader))
    }

    /// Curves for `object`'s `action`, in table order. Empty when either
    /// index is out of range.
    pub fn resolve(&self, object: usize, action: usize) -> Vec<CurveHandle> {
        let Some(action) = self
            .def
            .objects
            .get(object)
            .and_then(|o| o.actions.get(action))
        else {
            return Vec::new();
        };
        action
            .curves
            .iter()
            .filter_map(|name| self.curves.get(name).cloned())
            .collect()
    }

    pub fn num_objects(&self) -> usize {
        self.def.objects.len()
    }

    /// Number of actions for `object` (zero when out of range).
    pub fn actions(&self, object: usize) -> usize {
        self.def.objects.get(object).map_or(0, |o| o.actions.len())
    }

    pub fn curve(&self, name: &str) -> Option<&CurveHandle> {
        self.curves.get(name)
    }

    pub fn num_curves(&self) -> usize {
        self.curves.len()
    }

    pub fn failed_curves(&self) -> &[String] {
        &self.failed
    }

    pub fn def(&self) -> &AnimTableDef {
        &self.def
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::SplineNode;

    fn flat(y: f32) -> Spline1f {
        Spline1f::new(vec![SplineNode::new(0.0, y, 0.0)]).unwrap()
    }

    #[test]
    fn identifier_check() {
        assert!(has_anim_table_identifier(b"ANTB\x00\x01"));
        assert!(!has_anim_table_identifier(b"ANT"));
        assert!(!has_anim_table_identifier(b"BTNA...."));
    }

    #[test]
    fn out_of_range_resolves_empty() {
        let mut loader = MapCurveLoader::new();
        loader.insert("a", flat(1.0));
        let table = AnimTable::from_json(
            r#"{ "objects": [ { "actions": [ { "curves": ["a"] } ] } ] }"#,
            &mut loader,
        )
        .unwrap();
        assert_eq!(table.resolve(0, 0).len(), 1);
        assert!(table.resolve(0, 1).is_empty());
        assert!(table.resolve(3, 0).is_empty());
        assert_eq!(table.actions(7), 0);
    }

    #[test]
    fn missing_curves_are_recorded_and_skipped() {
        let mut loader = MapCurveLoader::new();
        loader.insert("a", flat(1.0));
        let def = AnimTableDef {
            objects: vec![AnimListDef {
                actions: vec![AnimActionDef {
                    curves: vec!["a".into(), "ghost".into()],
                }],
            }],
        };
        let table = AnimTable::load(def, &mut loader);
        assert_eq!(table.failed_curves(), &["ghost".to_string()]);
        assert_eq!(table.resolve(0, 0).len(), 1);
    }
}
