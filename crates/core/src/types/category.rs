//! Vehicle catalog categories.

use serde::{Deserialize, Serialize};

/// Top-level vehicle category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "shop.vehicle_category"))]
pub enum Category {
    #[serde(rename = "autos")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "autos"))]
    Car,
    #[serde(rename = "motos")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "motos"))]
    Motorcycle,
    #[serde(rename = "bicicletas")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "bicicletas"))]
    Bicycle,
    #[serde(rename = "scooters")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "scooters"))]
    Scooter,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Car, Self::Motorcycle, Self::Bicycle, Self::Scooter];

    /// Wire name / URL slug.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Car => "autos",
            Self::Motorcycle => "motos",
            Self::Bicycle => "bicicletas",
            Self::Scooter => "scooters",
        }
    }

    /// Human-readable label for navigation menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Car => "Autos eléctricos",
            Self::Motorcycle => "Motos eléctricas",
            Self::Bicycle => "Bicicletas eléctricas",
            Self::Scooter => "Scooters",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slug() {
        assert_eq!("motos".parse::<Category>(), Ok(Category::Motorcycle));
        assert!("trucks".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_uses_slug() {
        assert_eq!(serde_json::to_string(&Category::Scooter).unwrap(), "\"scooters\"");
    }
}
