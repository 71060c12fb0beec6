use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(CharacterId);

/// Life status of a character. The remote API is inconsistent about casing
/// (`"Alive"`, `"unknown"`), so parsing ignores ASCII case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterStatus {
    Alive,
    Dead,
    Unknown,
}

impl CharacterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }

    /// Display label, matching the capitalisation the API uses for known states.
    pub fn label(self) -> &'static str {
        match self {
            Self::Alive => "Alive",
            Self::Dead => "Dead",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterStatus {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("alive") {
            Ok(Self::Alive)
        } else if raw.eq_ignore_ascii_case("dead") {
            Ok(Self::Dead)
        } else if raw.eq_ignore_ascii_case("unknown") {
            Ok(Self::Unknown)
        } else {
            Err(ParseError::Status(raw.to_string()))
        }
    }
}

impl Serialize for CharacterStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CharacterStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub species: String,
    pub status: CharacterStatus,
    pub gender: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub image: String,
}

impl Character {
    pub fn image_url(&self) -> Option<&str> {
        let image = self.image.trim();
        (!image.is_empty()).then_some(image)
    }

    /// Creation date the way the listing shows it, e.g. `11/4/2017`.
    pub fn created_display(&self) -> String {
        self.created.format("%-m/%-d/%Y").to_string()
    }
}
