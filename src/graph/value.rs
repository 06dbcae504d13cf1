//! Value-enum voor graph-parameters die blend spaces aansturen.

use core::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Beschikbare parametertypes binnen een graph-instantie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Een enkele numerieke waarde.
    Number(f32),
    /// Een 2D-vector, bv. een richting of snelheid.
    Vector2(Vec2),
    /// Een booleaanse waarde.
    Boolean(bool),
}

impl Value {
    /// Geeft de variantnaam terug. Wordt gebruikt in foutmeldingen.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Vector2(_) => ValueKind::Vector2,
            Self::Boolean(_) => ValueKind::Boolean,
        }
    }

    /// Verwacht een `Number` en retourneert de f32-waarde.
    pub fn expect_number(&self) -> Result<f32, ValueError> {
        match self {
            Self::Number(value) => Ok(*value),
            _ => Err(ValueError::type_mismatch("Number", self.kind())),
        }
    }

    /// Verwacht een `Vector2` en retourneert de componenten.
    pub fn expect_vector2(&self) -> Result<Vec2, ValueError> {
        match self {
            Self::Vector2(vector) => Ok(*vector),
            _ => Err(ValueError::type_mismatch("Vector2", self.kind())),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Number(value)
    }
}

impl From<Vec2> for Value {
    fn from(value: Vec2) -> Self {
        Self::Vector2(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Typefout voor wanneer een `Value` naar het verkeerde type wordt
/// geconverteerd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    expected: &'static str,
    found: ValueKind,
}

impl ValueError {
    #[must_use]
    pub fn type_mismatch(expected: &'static str, found: ValueKind) -> Self {
        Self { expected, found }
    }

    #[must_use]
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    #[must_use]
    pub fn found(&self) -> ValueKind {
        self.found
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verwachtte type {}, maar kreeg {}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ValueError {}

/// Beschrijft het type van een `Value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Vector2,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Number => "Number",
            Self::Vector2 => "Vector2",
            Self::Boolean => "Boolean",
        };
        f.write_str(name)
    }
}
