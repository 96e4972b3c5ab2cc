use std::collections::BTreeSet;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;
use crate::error::{ReshapeError, Result};

/// Display color of a continent.
pub type Color = Srgb<u8>;

/// Color used for continents the catalog does not know.
pub const UNKNOWN_COLOR: Color = Srgb::new(128, 128, 128);

/// Canonical continent order shared by every chart.
pub const CONTINENT_ORDER: [&str; 6] = [
    "Asia",
    "Africa",
    "Europe",
    "North America",
    "Oceania",
    "South America",
];

const CONTINENT_COLORS: [Color; 6] = [
    Srgb::new(0x1f, 0x77, 0xb4),
    Srgb::new(0x2c, 0xa0, 0x2c),
    Srgb::new(0xff, 0x7f, 0x0e),
    Srgb::new(0xd6, 0x27, 0x28),
    Srgb::new(0x94, 0x67, 0xbd),
    Srgb::new(0x8c, 0x56, 0x4b),
];

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Srgb::new(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// `#rrggbb` form of a color.
pub fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

// ---------------------------------------------------------------------------
// ContinentCatalog
// ---------------------------------------------------------------------------

/// Ordered continent names with a display color each.
///
/// Immutable once built; components take it by reference so every table
/// and chart agrees on continent order and color.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinentCatalog {
    names: Vec<String>,
    colors: Vec<Color>,
}

impl Default for ContinentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ContinentCatalog {
    /// The six continents in canonical order with their standard colors.
    pub fn standard() -> Self {
        ContinentCatalog {
            names: CONTINENT_ORDER.iter().map(|n| n.to_string()).collect(),
            colors: CONTINENT_COLORS.to_vec(),
        }
    }

    /// Catalog with a custom order. Standard continents keep their usual
    /// color; other names get generated hues.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        check_names(&names)?;

        let mut generated = generate_palette(names.len()).into_iter();
        let colors = names
            .iter()
            .map(|name| {
                let fallback = generated.next().unwrap_or(UNKNOWN_COLOR);
                CONTINENT_ORDER
                    .iter()
                    .position(|c| c == name)
                    .map_or(fallback, |i| CONTINENT_COLORS[i])
            })
            .collect();

        Ok(ContinentCatalog { names, colors })
    }

    /// Catalog from `(name, "#rrggbb")` pairs.
    pub fn with_colors<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut names = Vec::new();
        let mut colors = Vec::new();
        for (name, hex) in entries {
            let color = Color::from_str(hex).map_err(|e| {
                ReshapeError::Catalog(format!("bad color '{hex}' for {name}: {e}"))
            })?;
            names.push(name.to_string());
            colors.push(color);
        }
        check_names(&names)?;
        Ok(ContinentCatalog { names, colors })
    }

    /// Continent names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical position of `name`, `None` if unknown.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Sort key for a continent cell: the catalog position, or `len()` for
    /// unknown and missing values so they sort after every known continent.
    pub fn sort_key(&self, value: &Value) -> usize {
        value
            .as_str()
            .and_then(|name| self.position(name))
            .unwrap_or(self.names.len())
    }

    /// Look up the colour for a continent.
    pub fn color_for(&self, name: &str) -> Color {
        self.position(name)
            .map_or(UNKNOWN_COLOR, |i| self.colors[i])
    }

    /// Return the legend entries (continent → `#rrggbb`) in canonical order.
    pub fn legend_entries(&self) -> Vec<(String, String)> {
        self.names
            .iter()
            .zip(&self.colors)
            .map(|(n, c)| (n.clone(), to_hex(*c)))
            .collect()
    }
}

fn check_names(names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(ReshapeError::Catalog("no continents given".into()));
    }
    let mut seen = BTreeSet::new();
    for name in names {
        if name.is_empty() {
            return Err(ReshapeError::Catalog("empty continent name".into()));
        }
        if !seen.insert(name.as_str()) {
            return Err(ReshapeError::Catalog(format!("duplicate continent '{name}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order_and_colors() {
        let catalog = ContinentCatalog::standard();
        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, CONTINENT_ORDER);
        assert_eq!(to_hex(catalog.color_for("Asia")), "#1f77b4");
        assert_eq!(to_hex(catalog.color_for("South America")), "#8c564b");
    }

    #[test]
    fn test_unknown_continent_sorts_last_and_is_gray() {
        let catalog = ContinentCatalog::standard();
        assert_eq!(catalog.position("Antarctica"), None);
        assert_eq!(catalog.sort_key(&Value::from("Antarctica")), 6);
        assert_eq!(catalog.sort_key(&Value::Null), 6);
        assert_eq!(catalog.sort_key(&Value::from("Europe")), 2);
        assert_eq!(catalog.color_for("Antarctica"), UNKNOWN_COLOR);
    }

    #[test]
    fn test_from_names_keeps_standard_colors() {
        let catalog = ContinentCatalog::from_names(["Europe", "Antarctica"]).unwrap();
        assert_eq!(catalog.position("Europe"), Some(0));
        assert_eq!(to_hex(catalog.color_for("Europe")), "#ff7f0e");
        assert_ne!(catalog.color_for("Antarctica"), UNKNOWN_COLOR);
    }

    #[test]
    fn test_from_names_rejects_duplicates() {
        let err = ContinentCatalog::from_names(["Asia", "Asia"]).unwrap_err();
        assert!(matches!(err, ReshapeError::Catalog(_)));
        assert!(ContinentCatalog::from_names(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_with_colors_parses_hex() {
        let catalog =
            ContinentCatalog::with_colors([("Asia", "#000000"), ("Africa", "ffffff")]).unwrap();
        assert_eq!(catalog.legend_entries()[1], ("Africa".to_string(), "#ffffff".to_string()));
        assert!(ContinentCatalog::with_colors([("Asia", "#zzzzzz")]).is_err());
    }

    #[test]
    fn test_generate_palette_is_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        let unique: BTreeSet<(u8, u8, u8)> =
            palette.iter().map(|c| (c.red, c.green, c.blue)).collect();
        assert_eq!(unique.len(), 4);
        assert!(generate_palette(0).is_empty());
    }
}
