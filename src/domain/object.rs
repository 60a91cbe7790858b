// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory object identity
//!
//! The topology core never owns inventory objects. It only reads their
//! identity (class name + id) and display name from the object store.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque inventory object identifier
///
/// Identifiers are whatever the object store hands out. The reference
/// in-memory store generates UUID v7 strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Sentinel used by callers of `reconnect` to leave a side untouched
    pub const NO_OP: &'static str = "-1";

    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh time-ordered identifier
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The "leave this side alone" sentinel
    pub fn no_op() -> Self {
        Self(Self::NO_OP.to_string())
    }

    pub fn is_no_op(&self) -> bool {
        self.0 == Self::NO_OP
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reference to an inventory object: class name plus id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub class_name: String,
    pub id: ObjectId,
}

impl ObjectRef {
    pub fn new(class_name: impl Into<String>, id: impl Into<ObjectId>) -> Self {
        Self {
            class_name: class_name.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.class_name)
    }
}

/// Lightweight view of an inventory object (identity and name)
///
/// Ordering is by class name, then id, so result maps keyed by
/// `ObjectLight` iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectLight {
    pub class_name: String,
    pub id: ObjectId,
    pub name: String,
}

impl ObjectLight {
    pub fn new(
        class_name: impl Into<String>,
        id: impl Into<ObjectId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            id: id.into(),
            name: name.into(),
        }
    }

    /// Identity of this object without its name
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.class_name.clone(), self.id.clone())
    }

    pub fn is(&self, object: &ObjectRef) -> bool {
        self.id == object.id
    }
}

impl fmt::Display for ObjectLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.class_name)
    }
}

impl From<&ObjectLight> for ObjectRef {
    fn from(object: &ObjectLight) -> Self {
        object.object_ref()
    }
}
