//! Route network importance classes

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordinal importance tier of a route network (1 = most important)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum NetworkClass {
    /// `iwn`, `icn`
    International = 1,
    /// `nwn`, `ncn`
    National = 2,
    /// `rwn`, `rcn`
    Regional = 3,
    /// Local, unknown or untagged networks
    #[default]
    Other = 4,
}

impl NetworkClass {
    /// Ordinal value written into the `network` attribute
    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Classify a `network` tag value
pub fn classify(network: Option<&str>) -> NetworkClass {
    match network.unwrap_or("") {
        "iwn" | "icn" => NetworkClass::International,
        "nwn" | "ncn" => NetworkClass::National,
        "rwn" | "rcn" => NetworkClass::Regional,
        _ => NetworkClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_networks() {
        assert_eq!(classify(Some("iwn")), NetworkClass::International);
        assert_eq!(classify(Some("icn")), NetworkClass::International);
        assert_eq!(classify(Some("nwn")), NetworkClass::National);
        assert_eq!(classify(Some("ncn")), NetworkClass::National);
        assert_eq!(classify(Some("rwn")), NetworkClass::Regional);
        assert_eq!(classify(Some("rcn")), NetworkClass::Regional);
    }

    #[test]
    fn test_classify_defaults_to_other() {
        for network in [None, Some(""), Some("lwn"), Some("lcn"), Some("NCN"), Some(" ncn")] {
            assert_eq!(classify(network), NetworkClass::Other, "{network:?}");
        }
    }

    #[test]
    fn test_ordinals() {
        assert_eq!(NetworkClass::International.ordinal(), 1);
        assert_eq!(NetworkClass::National.ordinal(), 2);
        assert_eq!(NetworkClass::Regional.ordinal(), 3);
        assert_eq!(NetworkClass::Other.ordinal(), 4);
        assert_eq!(NetworkClass::default(), NetworkClass::Other);
    }
}
