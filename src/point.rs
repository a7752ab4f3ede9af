//! Survey marker records and filter criteria
//!
//! Closed code tables for marker categories and conditions (each variant
//! carries a short persistence code and a display label), the read-only
//! [`PointOfInterest`] record owned by the point store, and the
//! [`FilterCriteria`] consumed by nearest queries.

use crate::coord::GeographicCoordinate;

/// Physical category of a survey marker.
///
/// Codes are the two-letter values used by the archive data set and are
/// stored verbatim; unknown codes decode to [`Category::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Active,
    Berntsen,
    Block,
    Bolt,
    BuriedBlock,
    Cannon,
    Centre,
    ConcreteRing,
    Cut,
    Fbm,
    Fenomark,
    Intersected,
    Monument,
    Other,
    Pillar,
    Platform,
    Rivet,
    Spider,
    SurfaceBlock,
    UserAdded,
}

/// `(variant, code, label)` rows for the category table.
const CATEGORY_TABLE: [(Category, &str, &str); 20] = [
    (Category::Active, "AC", "Active"),
    (Category::Berntsen, "BE", "Berntsen"),
    (Category::Block, "BL", "Block"),
    (Category::Bolt, "BO", "Bolt"),
    (Category::BuriedBlock, "BB", "Buried Block"),
    (Category::Cannon, "CA", "Cannon"),
    (Category::Centre, "CE", "Centre"),
    (Category::ConcreteRing, "CR", "Concrete Ring"),
    (Category::Cut, "CT", "Cut"),
    (Category::Fbm, "FB", "FBM"),
    (Category::Fenomark, "FE", "Fenomark"),
    (Category::Intersected, "IN", "Intersected Station"),
    (Category::Monument, "MO", "Monument"),
    (Category::Other, "OT", "Other"),
    (Category::Pillar, "PI", "Pillar"),
    (Category::Platform, "PB", "Platform Bolt"),
    (Category::Rivet, "RI", "Rivet"),
    (Category::Spider, "SP", "Spider"),
    (Category::SurfaceBlock, "SB", "Surface Block"),
    (Category::UserAdded, "UA", "Unknown - User Added"),
];

impl Category {
    /// Two-letter persistence code.
    pub fn code(self) -> &'static str {
        CATEGORY_TABLE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, code, _)| *code)
            .unwrap_or("OT")
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        CATEGORY_TABLE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Other")
    }

    /// Decode a persistence code; unknown codes become [`Category::Other`].
    pub fn from_code(code: &str) -> Category {
        CATEGORY_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(cat, _, _)| *cat)
            .unwrap_or(Category::Other)
    }

    /// Passive stations: everything that is not a pillar, an FBM or an
    /// intersected station.
    pub fn is_passive(self) -> bool {
        !matches!(self, Category::Pillar | Category::Fbm | Category::Intersected)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Logged condition of a marker.
///
/// Single-character persistence codes; a space means "not logged". Unknown
/// codes decode to [`Condition::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    NotLogged,
    CouldntFind,
    Good,
    SlightlyDamaged,
    Converted,
    Damaged,
    Remains,
    Toppled,
    Moved,
    PossiblyMissing,
    Missing,
    Visible,
    Inaccessible,
    Unknown,
}

const CONDITION_TABLE: [(Condition, &str, &str); 14] = [
    (Condition::NotLogged, " ", "Not Logged"),
    (Condition::CouldntFind, "N", "Couldn't Find"),
    (Condition::Good, "G", "Good"),
    (Condition::SlightlyDamaged, "S", "Slightly Damaged"),
    (Condition::Converted, "C", "Converted"),
    (Condition::Damaged, "D", "Damaged"),
    (Condition::Remains, "R", "Remains"),
    (Condition::Toppled, "T", "Toppled"),
    (Condition::Moved, "M", "Moved"),
    (Condition::PossiblyMissing, "Q", "Possibly Missing"),
    (Condition::Missing, "X", "Destroyed"),
    (Condition::Visible, "V", "Unreachable but Visible"),
    (Condition::Inaccessible, "P", "Inaccessible"),
    (Condition::Unknown, "U", "Unknown"),
];

impl Condition {
    pub fn code(self) -> &'static str {
        CONDITION_TABLE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, code, _)| *code)
            .unwrap_or("U")
    }

    pub fn label(self) -> &'static str {
        CONDITION_TABLE
            .iter()
            .find(|(c, _, _)| *c == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown")
    }

    /// Decode a persistence code; unknown codes become [`Condition::Unknown`].
    pub fn from_code(code: &str) -> Condition {
        CONDITION_TABLE
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(cond, _, _)| *cond)
            .unwrap_or(Condition::Unknown)
    }

    /// Conditions meaning the marker could not be located on the ground.
    pub fn is_unfound(self) -> bool {
        matches!(
            self,
            Condition::CouldntFind | Condition::PossiblyMissing | Condition::Missing
        )
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A survey marker as supplied by the point store.
///
/// This crate only reads these records; ownership and mutation live with the
/// store. `marked` and `unsynced` are per-user overlay flags joined in by
/// the store, not intrinsic marker attributes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointOfInterest {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub condition: Condition,
    pub coord: GeographicCoordinate,
    /// User has flagged this marker for attention
    pub marked: bool,
    /// Condition of a log entry not yet uploaded, if one exists
    pub unsynced: Option<Condition>,
}

/// Category restriction, persisted as integer codes `0..=6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeFilter {
    PillarsOnly,
    PillarsAndFbm,
    FbmOnly,
    PassiveOnly,
    IntersectedOnly,
    AllExceptIntersected,
    All,
}

impl TypeFilter {
    /// Decode a persisted integer code; out-of-range falls back to the
    /// default (pillars only), matching the archive's behavior.
    pub fn from_code(code: u8) -> TypeFilter {
        match code {
            0 => TypeFilter::PillarsOnly,
            1 => TypeFilter::PillarsAndFbm,
            2 => TypeFilter::FbmOnly,
            3 => TypeFilter::PassiveOnly,
            4 => TypeFilter::IntersectedOnly,
            5 => TypeFilter::AllExceptIntersected,
            6 => TypeFilter::All,
            _ => TypeFilter::PillarsOnly,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            TypeFilter::PillarsOnly => 0,
            TypeFilter::PillarsAndFbm => 1,
            TypeFilter::FbmOnly => 2,
            TypeFilter::PassiveOnly => 3,
            TypeFilter::IntersectedOnly => 4,
            TypeFilter::AllExceptIntersected => 5,
            TypeFilter::All => 6,
        }
    }

    pub fn includes_pillars(self) -> bool {
        matches!(
            self,
            TypeFilter::PillarsOnly
                | TypeFilter::PillarsAndFbm
                | TypeFilter::AllExceptIntersected
                | TypeFilter::All
        )
    }

    pub fn includes_fbms(self) -> bool {
        matches!(
            self,
            TypeFilter::FbmOnly
                | TypeFilter::PillarsAndFbm
                | TypeFilter::AllExceptIntersected
                | TypeFilter::All
        )
    }

    pub fn includes_passives(self) -> bool {
        matches!(
            self,
            TypeFilter::PassiveOnly | TypeFilter::AllExceptIntersected | TypeFilter::All
        )
    }

    pub fn includes_intersecteds(self) -> bool {
        matches!(self, TypeFilter::IntersectedOnly | TypeFilter::All)
    }

    /// Plain category membership test, before any per-user join.
    pub fn matches(self, category: Category) -> bool {
        match category {
            Category::Pillar => self.includes_pillars(),
            Category::Fbm => self.includes_fbms(),
            Category::Intersected => self.includes_intersecteds(),
            _ => self.includes_passives(),
        }
    }
}

/// Logged-state restriction, persisted as integer codes `0..=4`.
///
/// `Marked` and `Unsynced` select per-user overlay flags supplied by the
/// store rather than intrinsic marker attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusFilter {
    Any,
    Logged,
    NotLogged,
    Marked,
    Unsynced,
}

impl StatusFilter {
    /// Decode a persisted integer code; out-of-range falls back to `Any`.
    pub fn from_code(code: u8) -> StatusFilter {
        match code {
            0 => StatusFilter::Any,
            1 => StatusFilter::Logged,
            2 => StatusFilter::NotLogged,
            3 => StatusFilter::Marked,
            4 => StatusFilter::Unsynced,
            _ => StatusFilter::Any,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            StatusFilter::Any => 0,
            StatusFilter::Logged => 1,
            StatusFilter::NotLogged => 2,
            StatusFilter::Marked => 3,
            StatusFilter::Unsynced => 4,
        }
    }
}

/// The complete filter a nearest query runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterCriteria {
    pub type_filter: TypeFilter,
    pub status_filter: StatusFilter,
}

impl FilterCriteria {
    pub fn new(type_filter: TypeFilter, status_filter: StatusFilter) -> Self {
        Self { type_filter, status_filter }
    }

    /// Build criteria from caller-owned persisted integer codes.
    pub fn from_codes(type_code: u8, status_code: u8) -> Self {
        Self {
            type_filter: TypeFilter::from_code(type_code),
            status_filter: StatusFilter::from_code(status_code),
        }
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            type_filter: TypeFilter::PillarsOnly,
            status_filter: StatusFilter::Any,
        }
    }
}
