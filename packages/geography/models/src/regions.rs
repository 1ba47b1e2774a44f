//! Administrative region catalog.
//!
//! The 17 top-level administrative divisions form a closed enumeration.
//! Each region carries its canonical name (the spelling used by the
//! indicator and prediction tables) and the English label used by the
//! GADM boundary collection. Boundary labels are translated through
//! [`REGION_TABLE`]; labels that have no entry pass through unchanged.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One of the 17 top-level administrative divisions.
///
/// Variant order matches the canonical catalog order and the row order of
/// [`REGION_TABLE`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    /// Seoul Special City
    Seoul,
    /// Gyeonggi Province
    Gyeonggi,
    /// Gangwon Province
    Gangwon,
    /// South Gyeongsang Province
    Gyeongnam,
    /// North Gyeongsang Province
    Gyeongbuk,
    /// Gwangju Metropolitan City
    Gwangju,
    /// Daegu Metropolitan City
    Daegu,
    /// Daejeon Metropolitan City
    Daejeon,
    /// Busan Metropolitan City
    Busan,
    /// Sejong Special Self-Governing City
    Sejong,
    /// Ulsan Metropolitan City
    Ulsan,
    /// Incheon Metropolitan City
    Incheon,
    /// South Jeolla Province
    Jeonnam,
    /// North Jeolla Province
    Jeonbuk,
    /// Jeju Province
    Jeju,
    /// South Chungcheong Province
    Chungnam,
    /// North Chungcheong Province
    Chungbuk,
}

/// A row of the static region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEntry {
    /// The region this row describes.
    pub region: Region,
    /// Canonical name as it appears in the data tables.
    pub name: &'static str,
    /// English label used by the boundary collection (`NAME_1`).
    pub boundary_label: &'static str,
}

/// Static region table in canonical catalog order.
pub const REGION_TABLE: &[RegionEntry] = &[
    RegionEntry {
        region: Region::Seoul,
        name: "서울특별시",
        boundary_label: "Seoul",
    },
    RegionEntry {
        region: Region::Gyeonggi,
        name: "경기도",
        boundary_label: "Gyeonggi-do",
    },
    RegionEntry {
        region: Region::Gangwon,
        name: "강원도",
        boundary_label: "Gangwon-do",
    },
    RegionEntry {
        region: Region::Gyeongnam,
        name: "경상남도",
        boundary_label: "Gyeongsangnam-do",
    },
    RegionEntry {
        region: Region::Gyeongbuk,
        name: "경상북도",
        boundary_label: "Gyeongsangbuk-do",
    },
    RegionEntry {
        region: Region::Gwangju,
        name: "광주광역시",
        boundary_label: "Gwangju",
    },
    RegionEntry {
        region: Region::Daegu,
        name: "대구광역시",
        boundary_label: "Daegu",
    },
    RegionEntry {
        region: Region::Daejeon,
        name: "대전광역시",
        boundary_label: "Daejeon",
    },
    RegionEntry {
        region: Region::Busan,
        name: "부산광역시",
        boundary_label: "Busan",
    },
    RegionEntry {
        region: Region::Sejong,
        name: "세종특별자치시",
        boundary_label: "Sejong",
    },
    RegionEntry {
        region: Region::Ulsan,
        name: "울산광역시",
        boundary_label: "Ulsan",
    },
    RegionEntry {
        region: Region::Incheon,
        name: "인천광역시",
        boundary_label: "Incheon",
    },
    RegionEntry {
        region: Region::Jeonnam,
        name: "전라남도",
        boundary_label: "Jeollanam-do",
    },
    RegionEntry {
        region: Region::Jeonbuk,
        name: "전라북도",
        boundary_label: "Jeollabuk-do",
    },
    RegionEntry {
        region: Region::Jeju,
        name: "제주도",
        boundary_label: "Jeju",
    },
    RegionEntry {
        region: Region::Chungnam,
        name: "충청남도",
        boundary_label: "Chungcheongnam-do",
    },
    RegionEntry {
        region: Region::Chungbuk,
        name: "충청북도",
        boundary_label: "Chungcheongbuk-do",
    },
];

impl Region {
    /// Returns the table row for this region.
    #[must_use]
    pub const fn entry(self) -> &'static RegionEntry {
        &REGION_TABLE[self as usize]
    }

    /// Returns the canonical name used by the data tables.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.entry().name
    }

    /// Returns the English boundary label.
    #[must_use]
    pub const fn boundary_label(self) -> &'static str {
        self.entry().boundary_label
    }

    /// Returns all variants in catalog order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Seoul,
            Self::Gyeonggi,
            Self::Gangwon,
            Self::Gyeongnam,
            Self::Gyeongbuk,
            Self::Gwangju,
            Self::Daegu,
            Self::Daejeon,
            Self::Busan,
            Self::Sejong,
            Self::Ulsan,
            Self::Incheon,
            Self::Jeonnam,
            Self::Jeonbuk,
            Self::Jeju,
            Self::Chungnam,
            Self::Chungbuk,
        ]
    }
}

/// The closed catalog of regions plus the boundary label translation.
///
/// Passed explicitly to the render pipeline so callers can see which
/// catalog a descriptor was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionCatalog {
    entries: &'static [RegionEntry],
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RegionCatalog {
    /// The standard 17-region catalog.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            entries: REGION_TABLE,
        }
    }

    /// Number of regions in the catalog.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty. Never true for [`Self::standard`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates regions in catalog order.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.entries.iter().map(|e| e.region)
    }

    /// Looks up a region by its canonical name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Region> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.region)
    }

    /// Looks up a region by its English boundary label.
    #[must_use]
    pub fn by_boundary_label(&self, label: &str) -> Option<Region> {
        let label = label.trim();
        self.entries
            .iter()
            .find(|e| e.boundary_label == label)
            .map(|e| e.region)
    }

    /// Resolves a boundary label that is either an English label or
    /// already a canonical name.
    #[must_use]
    pub fn resolve(&self, label: &str) -> Option<Region> {
        self.by_boundary_label(label)
            .or_else(|| self.by_name(label))
    }

    /// Translates a boundary label into the canonical region name.
    ///
    /// Labels without a table entry are returned unchanged.
    #[must_use]
    pub fn canonical_name<'a>(&self, label: &'a str) -> &'a str {
        self.resolve(label).map_or(label, |r| r.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_lookups_ignore_surrounding_whitespace() {
        let catalog = RegionCatalog::standard();
        assert_eq!(catalog.by_boundary_label(" Seoul "), Some(Region::Seoul));
        assert_eq!(catalog.by_name(" 서울특별시 "), Some(Region::Seoul));
    }

    #[test]
    fn canonical_labels_resolve_to_their_region() {
        let catalog = RegionCatalog::standard();
        assert_eq!(catalog.resolve("Busan"), Some(Region::Busan));
        assert_eq!(catalog.resolve("부산광역시"), Some(Region::Busan));
        assert_eq!(catalog.resolve("Atlantis"), None);
        assert_eq!(catalog.canonical_name("부산광역시"), "부산광역시");
        assert_eq!(catalog.canonical_name("Atlantis"), "Atlantis");
    }

    #[test]
    fn catalog_has_seventeen_regions() {
        assert_eq!(RegionCatalog::standard().len(), 17);
        assert_eq!(Region::all().len(), 17);
    }

    #[test]
    fn table_order_matches_variant_order() {
        for (i, region) in Region::all().iter().enumerate() {
            assert_eq!(REGION_TABLE[i].region, *region, "row {i} out of order");
            assert_eq!(*region as usize, i);
        }
    }

    #[test]
    fn boundary_labels_translate() {
        let catalog = RegionCatalog::standard();
        assert_eq!(catalog.canonical_name("Seoul"), "서울특별시");
        assert_eq!(catalog.canonical_name("Jeju"), "제주도");
        assert_eq!(catalog.canonical_name("Chungcheongbuk-do"), "충청북도");
    }

    #[test]
    fn unknown_label_passes_through() {
        let catalog = RegionCatalog::standard();
        assert_eq!(catalog.canonical_name("Atlantis"), "Atlantis");
        assert_eq!(catalog.by_boundary_label("Atlantis"), None);
    }

    #[test]
    fn name_lookup_roundtrip() {
        let catalog = RegionCatalog::standard();
        for region in catalog.regions() {
            assert_eq!(catalog.by_name(region.name()), Some(region));
            assert_eq!(catalog.by_boundary_label(region.boundary_label()), Some(region));
        }
        assert_eq!(catalog.by_name(" 경기도 "), Some(Region::Gyeonggi));
    }

    #[test]
    fn region_parses_from_identifier() {
        assert_eq!("SEOUL".parse::<Region>().ok(), Some(Region::Seoul));
        assert_eq!(Region::Chungnam.to_string(), "CHUNGNAM");
    }
}
