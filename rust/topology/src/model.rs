// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types describing spaces and the relationships between them.

use serde::{Deserialize, Serialize};

use crate::circulation::CoreType;
use crate::error::{Error, Result};

/// Area target (m²) assumed for spaces without one.
pub const DEFAULT_AREA_TARGET: f64 = 20.0;

/// Minimum area (m²) assumed when neither a minimum nor a target is given.
pub const DEFAULT_AREA_MIN: f64 = 10.0;

/// Functional category of a space.
///
/// Parsing is lenient: unknown strings become [`SpaceCategory::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpaceCategory {
    Office,
    Meeting,
    Corridor,
    Toilet,
    Entrance,
    /// Stair, elevator or shaft that repeats on every storey.
    Core,
    Storage,
    #[default]
    Generic,
}

impl SpaceCategory {
    /// Normalizes a category string (trimmed, case-insensitive).
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "office" => SpaceCategory::Office,
            "meeting" => SpaceCategory::Meeting,
            "corridor" => SpaceCategory::Corridor,
            "toilet" => SpaceCategory::Toilet,
            "entrance" => SpaceCategory::Entrance,
            "core" | "vertical-core" | "vertical_core" => SpaceCategory::Core,
            "storage" => SpaceCategory::Storage,
            _ => SpaceCategory::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceCategory::Office => "office",
            SpaceCategory::Meeting => "meeting",
            SpaceCategory::Corridor => "corridor",
            SpaceCategory::Toilet => "toilet",
            SpaceCategory::Entrance => "entrance",
            SpaceCategory::Core => "core",
            SpaceCategory::Storage => "storage",
            SpaceCategory::Generic => "generic",
        }
    }

    /// Corridors and entrances are preferred as the root of placement order.
    pub fn is_circulation(&self) -> bool {
        matches!(self, SpaceCategory::Corridor | SpaceCategory::Entrance)
    }
}

impl From<String> for SpaceCategory {
    fn from(value: String) -> Self {
        SpaceCategory::parse(&value)
    }
}

impl From<SpaceCategory> for String {
    fn from(value: SpaceCategory) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for SpaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes of a single space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpaceSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: SpaceCategory,
    /// Target floor area in m².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_target: Option<f64>,
    /// Minimum acceptable floor area in m².
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_min: Option<f64>,
    /// Clear height in m, overriding the global default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storey_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storey_elevation: Option<f64>,
}

impl SpaceSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: SpaceCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_area(mut self, target: f64, min: Option<f64>) -> Self {
        self.area_target = Some(target);
        self.area_min = min;
        self
    }

    pub fn with_storey(mut self, storey_id: impl Into<String>, elevation: f64) -> Self {
        self.storey_id = Some(storey_id.into());
        self.storey_elevation = Some(elevation);
        self
    }

    pub fn with_aspect_ratio(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.aspect_ratio_min = min;
        self.aspect_ratio_max = max;
        self
    }

    /// Target area, falling back to [`DEFAULT_AREA_TARGET`].
    pub fn effective_area_target(&self) -> f64 {
        self.area_target.unwrap_or(DEFAULT_AREA_TARGET)
    }

    /// Minimum area, falling back to the target and then [`DEFAULT_AREA_MIN`].
    pub fn effective_area_min(&self) -> f64 {
        self.area_min
            .or(self.area_target)
            .unwrap_or(DEFAULT_AREA_MIN)
    }

    /// Circulation role derived from category, id and name.
    pub fn core_type(&self) -> CoreType {
        crate::circulation::classify(self)
    }

    /// True for stairs, elevators and anything explicitly categorized as a core.
    pub fn is_vertical_core(&self) -> bool {
        self.category == SpaceCategory::Core || self.core_type() != CoreType::Generic
    }

    /// Checks that present area attributes are positive and finite.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("area_target", self.area_target), ("area_min", self.area_min)] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(Error::InvalidArea {
                        space_id: self.id.clone(),
                        field,
                        value: v,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Two spaces share a physical boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyEdge {
    pub space_a: String,
    pub space_b: String,
}

impl AdjacencyEdge {
    pub fn new(space_a: impl Into<String>, space_b: impl Into<String>) -> Self {
        Self {
            space_a: space_a.into(),
            space_b: space_b.into(),
        }
    }
}

/// Two spaces are traversable through an opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEdge {
    pub space_a: String,
    pub space_b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_height: Option<f64>,
}

impl ConnectionEdge {
    pub fn new(space_a: impl Into<String>, space_b: impl Into<String>) -> Self {
        Self {
            space_a: space_a.into(),
            space_b: space_b.into(),
            door_width: None,
            door_height: None,
        }
    }

    pub fn with_door(mut self, width: f64, height: f64) -> Self {
        self.door_width = Some(width);
        self.door_height = Some(height);
        self
    }
}

/// A circulation core the building is required to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalCoreSpec {
    pub core_id: String,
    pub core_type: CoreType,
}

impl VerticalCoreSpec {
    pub fn new(core_id: impl Into<String>, core_type: CoreType) -> Self {
        Self {
            core_id: core_id.into(),
            core_type,
        }
    }
}
