//! Keyword/group labels
//!
//! A [`Label`] is a tree of named [`Group`]s, each holding ordered
//! [`Keyword`]s. Every cube, projection and camera model is configured
//! through one. Names compare case-insensitively.
//!
//! ```text
//! Object = IsisCube
//!   Group = Mapping
//!     ProjectionName  = Sinusoidal
//!     CenterLongitude = 0.0 <degrees>
//!   End_Group
//! End_Object
//! End
//! ```

pub mod serial;

use crate::error::{Error, Result};
use std::fmt;

// ============================================================================
// Value
// ============================================================================

/// A single keyword value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Double(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value. Text is parsed when it looks like a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Integer view of the value. Doubles with a fractional part are rejected.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Double(d) if d.fract() == 0.0 && d.is_finite() => Some(*d as i64),
            Value::Double(_) => None,
            Value::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Text view, only for text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

// ============================================================================
// Keyword
// ============================================================================

/// A named, possibly multi-valued keyword with an optional unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    name: String,
    values: Vec<Value>,
    unit: Option<String>,
}

impl Keyword {
    /// Create a single-valued keyword.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
            unit: None,
        }
    }

    /// Create a keyword from a list of values.
    pub fn with_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
            unit: None,
        }
    }

    /// Attach a unit (`degrees`, `meters/pixel`, ...).
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// True when the name matches, ignoring ASCII case.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First value as a double.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyword`] when the keyword is empty or not numeric.
    pub fn as_f64(&self) -> Result<f64> {
        self.f64_at(0)
    }

    /// Value at `index` as a double.
    pub fn f64_at(&self, index: usize) -> Result<f64> {
        self.values
            .get(index)
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::invalid_keyword(&self.name, self.text_at(index), "not a number"))
    }

    /// First value as an integer.
    pub fn as_i64(&self) -> Result<i64> {
        self.values
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::invalid_keyword(&self.name, self.text(), "not an integer"))
    }

    /// First value rendered as text (empty when there is none).
    pub fn text(&self) -> String {
        self.text_at(0)
    }

    /// Value at `index` rendered as text (empty when absent).
    pub fn text_at(&self, index: usize) -> String {
        self.values
            .get(index)
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

// ============================================================================
// Group
// ============================================================================

/// Whether a group is written as `Group` or `Object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupKind {
    #[default]
    Group,
    Object,
}

/// A named collection of keywords and nested groups.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    name: String,
    kind: GroupKind,
    keywords: Vec<Keyword>,
    groups: Vec<Group>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a group that serializes as an `Object` block.
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Object,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }

    /// Look a keyword up without failing.
    pub fn find_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.is_named(name))
    }

    pub fn find_keyword_mut(&mut self, name: &str) -> Option<&mut Keyword> {
        self.keywords.iter_mut().find(|k| k.is_named(name))
    }

    pub fn has_keyword(&self, name: &str) -> bool {
        self.find_keyword(name).is_some()
    }

    /// Look a keyword up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKeyword`] naming this group.
    pub fn keyword(&self, name: &str) -> Result<&Keyword> {
        self.find_keyword(name)
            .ok_or_else(|| Error::missing_keyword(&self.name, name))
    }

    /// First value of a keyword as a double.
    pub fn f64(&self, name: &str) -> Result<f64> {
        self.keyword(name)?.as_f64()
    }

    /// First value of a keyword as an integer.
    pub fn i64(&self, name: &str) -> Result<i64> {
        self.keyword(name)?.as_i64()
    }

    /// First value of a keyword as text.
    pub fn text(&self, name: &str) -> Result<String> {
        Ok(self.keyword(name)?.text())
    }

    /// Insert a keyword, replacing any keyword of the same name in place.
    pub fn set(&mut self, keyword: Keyword) {
        match self.find_keyword_mut(keyword.name()) {
            Some(existing) => *existing = keyword,
            None => self.keywords.push(keyword),
        }
    }

    /// Remove a keyword by name.
    pub fn remove_keyword(&mut self, name: &str) -> Option<Keyword> {
        let idx = self.keywords.iter().position(|k| k.is_named(name))?;
        Some(self.keywords.remove(idx))
    }

    /// Direct child group.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.is_named(name))
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.is_named(name))
    }

    /// Search this group's subtree (depth first) for a group.
    pub fn find_group(&self, name: &str) -> Option<&Group> {
        if let Some(g) = self.group(name) {
            return Some(g);
        }
        self.groups.iter().find_map(|g| g.find_group(name))
    }

    pub fn find_group_mut(&mut self, name: &str) -> Option<&mut Group> {
        if let Some(idx) = self.groups.iter().position(|g| g.is_named(name)) {
            return Some(&mut self.groups[idx]);
        }
        for g in &mut self.groups {
            if let Some(found) = g.find_group_mut(name) {
                return Some(found);
            }
        }
        None
    }

    /// Append a child group and return it.
    pub fn add_group(&mut self, group: Group) -> &mut Group {
        self.groups.push(group);
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Remove the first direct child group with this name.
    pub fn remove_group(&mut self, name: &str) -> Option<Group> {
        let idx = self.groups.iter().position(|g| g.is_named(name))?;
        Some(self.groups.remove(idx))
    }
}

// ============================================================================
// Label
// ============================================================================

/// Root of a keyword/group tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Label {
    root: Group,
}

impl Label {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// Search the whole tree for a group.
    pub fn find_group(&self, name: &str) -> Option<&Group> {
        self.root.find_group(name)
    }

    pub fn find_group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.root.find_group_mut(name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.find_group(name).is_some()
    }

    /// Search the whole tree for a group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingGroup`] when no group has this name.
    pub fn group(&self, name: &str) -> Result<&Group> {
        self.find_group(name)
            .ok_or_else(|| Error::MissingGroup(name.to_string()))
    }

    pub fn group_mut(&mut self, name: &str) -> Result<&mut Group> {
        self.root
            .find_group_mut(name)
            .ok_or_else(|| Error::MissingGroup(name.to_string()))
    }

    /// Append a group at the top level.
    pub fn add_group(&mut self, group: Group) -> &mut Group {
        self.root.add_group(group)
    }

    /// Replace the first group with this name anywhere in the tree, or add
    /// it at the top level.
    pub fn set_group(&mut self, group: Group) {
        match self.root.find_group_mut(group.name()) {
            Some(existing) => *existing = group,
            None => {
                self.root.add_group(group);
            }
        }
    }

    /// Remove a group from anywhere in the tree.
    pub fn remove_group(&mut self, name: &str) -> Option<Group> {
        fn remove_from(group: &mut Group, name: &str) -> Option<Group> {
            if let Some(g) = group.remove_group(name) {
                return Some(g);
            }
            group.groups.iter_mut().find_map(|g| remove_from(g, name))
        }
        remove_from(&mut self.root, name)
    }

    /// Copy of the `Mapping` group.
    pub fn mapping(&self) -> Result<Group> {
        self.group("Mapping").cloned()
    }
}

impl From<Group> for Label {
    /// Wrap a single group in a label.
    fn from(group: Group) -> Self {
        let mut label = Label::new();
        label.add_group(group);
        label
    }
}
