//! Region codes, routing buckets and the destination-type decision table.

pub mod catalog;

pub use catalog::{Continent, PostalZone, Region, RegionCatalog, ZoneInfo, ZoneValue};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Home postal administration derived from the first two characters of a region code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionType {
    #[serde(rename = "CN")]
    Cn,
    #[serde(rename = "TW")]
    Tw,
    #[serde(rename = "HK")]
    Hk,
    #[serde(rename = "MO")]
    Mo,
    #[serde(rename = "XX")]
    Unrecognized,
}

impl RegionType {
    pub const ADMINISTRATIONS: [RegionType; 4] =
        [RegionType::Cn, RegionType::Tw, RegionType::Hk, RegionType::Mo];

    pub fn code(&self) -> &'static str {
        match self {
            RegionType::Cn => "CN",
            RegionType::Tw => "TW",
            RegionType::Hk => "HK",
            RegionType::Mo => "MO",
            RegionType::Unrecognized => "XX",
        }
    }

    pub fn is_recognized(&self) -> bool {
        *self != RegionType::Unrecognized
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Routing bucket used to pick a service's rate sub-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationType {
    Domestic,
    Mainland,
    Regional,
    RegionalTw,
    International,
}

impl DestinationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationType::Domestic => "domestic",
            DestinationType::Mainland => "mainland",
            DestinationType::Regional => "regional",
            DestinationType::RegionalTw => "regional_tw",
            DestinationType::International => "international",
        }
    }
}

impl fmt::Display for DestinationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailType {
    Letter,
    Postcard,
    Aerogramme,
    PrintedPapers,
    ItemsForBlind,
    SmallPacket,
    MBags,
    Parcel,
    Ems,
}

impl MailType {
    pub const ALL: [MailType; 9] = [
        MailType::Letter,
        MailType::Postcard,
        MailType::Aerogramme,
        MailType::PrintedPapers,
        MailType::ItemsForBlind,
        MailType::SmallPacket,
        MailType::MBags,
        MailType::Parcel,
        MailType::Ems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MailType::Letter => "letter",
            MailType::Postcard => "postcard",
            MailType::Aerogramme => "aerogramme",
            MailType::PrintedPapers => "printed_papers",
            MailType::ItemsForBlind => "items_for_blind",
            MailType::SmallPacket => "small_packet",
            MailType::MBags => "m_bags",
            MailType::Parcel => "parcel",
            MailType::Ems => "ems",
        }
    }

    /// Air zones are split by letters vs. everything else.
    pub fn letter_class(&self) -> LetterClass {
        match self {
            MailType::Letter => LetterClass::Letter,
            _ => LetterClass::Other,
        }
    }
}

impl fmt::Display for MailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MailType::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown mail type: {}", s))
    }
}

/// Delivery category: air, surface air lifted, or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailCategory {
    Air,
    Sal,
    Surface,
}

impl MailCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailCategory::Air => "air",
            MailCategory::Sal => "sal",
            MailCategory::Surface => "surface",
        }
    }
}

impl fmt::Display for MailCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MailCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "air" => Ok(MailCategory::Air),
            "sal" => Ok(MailCategory::Sal),
            "surface" => Ok(MailCategory::Surface),
            other => Err(format!("unknown mail category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterClass {
    Letter,
    Other,
}

/// Switches for catalog revisions that disagree on the decision table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierPolicy {
    /// Route Macau -> Taiwan mail to its own `regional_tw` bucket.
    pub regional_tw: bool,
}

/// Resolve the administration a region code belongs to.
///
/// Mainland provinces are written `CN-XX`, so only the first two characters matter.
pub fn resolve_region_type(code: &str) -> RegionType {
    match code.get(..2) {
        Some("CN") => RegionType::Cn,
        Some("TW") => RegionType::Tw,
        Some("HK") => RegionType::Hk,
        Some("MO") => RegionType::Mo,
        _ => RegionType::Unrecognized,
    }
}

/// Pick the destination bucket for a route. First matching rule wins:
/// same administration, mainland, foreign, Taiwan origin, then regional.
pub fn resolve_destination_type(
    origin: RegionType,
    destination_code: &str,
    policy: ClassifierPolicy,
) -> DestinationType {
    let destination = resolve_region_type(destination_code);

    if origin == destination {
        return DestinationType::Domestic;
    }
    if destination == RegionType::Cn {
        return DestinationType::Mainland;
    }
    if destination == RegionType::Unrecognized {
        return DestinationType::International;
    }
    // Taiwan sends HK/MO mail through its international table.
    if origin == RegionType::Tw {
        return DestinationType::International;
    }
    if policy.regional_tw && origin == RegionType::Mo && destination == RegionType::Tw {
        return DestinationType::RegionalTw;
    }
    DestinationType::Regional
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT: ClassifierPolicy = ClassifierPolicy { regional_tw: false };
    const SPLIT_TW: ClassifierPolicy = ClassifierPolicy { regional_tw: true };

    #[test]
    fn test_region_type_from_prefix() {
        assert_eq!(resolve_region_type("CN-BJ"), RegionType::Cn);
        assert_eq!(resolve_region_type("CN"), RegionType::Cn);
        assert_eq!(resolve_region_type("TW-TPE"), RegionType::Tw);
        assert_eq!(resolve_region_type("HK"), RegionType::Hk);
        assert_eq!(resolve_region_type("MO"), RegionType::Mo);
        assert_eq!(resolve_region_type("US"), RegionType::Unrecognized);
        assert_eq!(resolve_region_type("C"), RegionType::Unrecognized);
        assert_eq!(resolve_region_type(""), RegionType::Unrecognized);
    }

    #[test]
    fn test_region_type_is_case_sensitive() {
        assert_eq!(resolve_region_type("cn-bj"), RegionType::Unrecognized);
    }

    #[test]
    fn test_destination_domestic() {
        assert_eq!(
            resolve_destination_type(RegionType::Cn, "CN-SH", STRICT),
            DestinationType::Domestic
        );
        assert_eq!(
            resolve_destination_type(RegionType::Hk, "HK", STRICT),
            DestinationType::Domestic
        );
    }

    #[test]
    fn test_destination_mainland() {
        assert_eq!(
            resolve_destination_type(RegionType::Tw, "CN-FJ", STRICT),
            DestinationType::Mainland
        );
        assert_eq!(
            resolve_destination_type(RegionType::Mo, "CN-GD", SPLIT_TW),
            DestinationType::Mainland
        );
    }

    #[test]
    fn test_destination_international() {
        assert_eq!(
            resolve_destination_type(RegionType::Cn, "US", STRICT),
            DestinationType::International
        );
        assert_eq!(
            resolve_destination_type(RegionType::Tw, "HK", STRICT),
            DestinationType::International
        );
        assert_eq!(
            resolve_destination_type(RegionType::Tw, "MO", SPLIT_TW),
            DestinationType::International
        );
    }

    #[test]
    fn test_destination_regional() {
        assert_eq!(
            resolve_destination_type(RegionType::Cn, "HK", STRICT),
            DestinationType::Regional
        );
        assert_eq!(
            resolve_destination_type(RegionType::Hk, "TW", SPLIT_TW),
            DestinationType::Regional
        );
    }

    #[test]
    fn test_regional_tw_only_when_enabled() {
        assert_eq!(
            resolve_destination_type(RegionType::Mo, "TW", STRICT),
            DestinationType::Regional
        );
        assert_eq!(
            resolve_destination_type(RegionType::Mo, "TW", SPLIT_TW),
            DestinationType::RegionalTw
        );
    }

    #[test]
    fn test_mail_type_parse() {
        assert_eq!("m_bags".parse::<MailType>(), Ok(MailType::MBags));
        assert_eq!("items_for_blind".parse::<MailType>(), Ok(MailType::ItemsForBlind));
        assert!("telegram".parse::<MailType>().is_err());
        for m in MailType::ALL {
            assert_eq!(m.as_str().parse::<MailType>(), Ok(m));
        }
    }

    #[test]
    fn test_letter_class() {
        assert_eq!(MailType::Letter.letter_class(), LetterClass::Letter);
        assert_eq!(MailType::Postcard.letter_class(), LetterClass::Other);
        assert_eq!(MailType::Parcel.letter_class(), LetterClass::Other);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        let json = serde_json::to_string(&DestinationType::RegionalTw).unwrap();
        assert_eq!(json, "\"regional_tw\"");
        let json = serde_json::to_string(&MailType::PrintedPapers).unwrap();
        assert_eq!(json, "\"printed_papers\"");
        let json = serde_json::to_string(&RegionType::Unrecognized).unwrap();
        assert_eq!(json, "\"XX\"");
    }
}
