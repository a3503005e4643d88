//! Zone identity. The set is closed: `top`, `center`, `bottom`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Named layout region that can receive injected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Top,
    Center,
    Bottom,
}

impl Zone {
    /// Every zone, in layout order.
    pub const ALL: [Zone; 3] = [Zone::Top, Zone::Center, Zone::Bottom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Top => "top",
            Zone::Center => "center",
            Zone::Bottom => "bottom",
        }
    }

    /// Dense index into per-zone arrays.
    pub fn index(&self) -> usize {
        match self {
            Zone::Top => 0,
            Zone::Center => 1,
            Zone::Bottom => 2,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = BridgeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Zone::Top),
            "center" => Ok(Zone::Center),
            "bottom" => Ok(Zone::Bottom),
            _ => Err(BridgeError::UnknownZone(name.to_string())),
        }
    }
}

/// Fixed-size table holding one value per zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneMap<T> {
    slots: [T; 3],
}

impl<T> ZoneMap<T> {
    pub fn from_fn(mut make: impl FnMut(Zone) -> T) -> Self {
        Self {
            slots: Zone::ALL.map(&mut make),
        }
    }

    pub fn get(&self, zone: Zone) -> &T {
        &self.slots[zone.index()]
    }

    pub fn get_mut(&mut self, zone: Zone) -> &mut T {
        &mut self.slots[zone.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Zone, &T)> {
        Zone::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Zone, &mut T)> {
        Zone::ALL.into_iter().zip(self.slots.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names() {
        assert_eq!("top".parse::<Zone>().unwrap(), Zone::Top);
        assert_eq!(" Center ".parse::<Zone>().unwrap(), Zone::Center);
        assert_eq!("BOTTOM".parse::<Zone>().unwrap(), Zone::Bottom);
    }

    #[test]
    fn rejects_names_outside_the_set() {
        let err = "sidebar".parse::<Zone>().unwrap_err();
        assert!(matches!(err, BridgeError::UnknownZone(name) if name == "sidebar"));
    }

    #[test]
    fn zone_map_indexes_by_zone() {
        let mut map = ZoneMap::from_fn(|zone| zone.as_str().len());
        assert_eq!(*map.get(Zone::Center), 6);
        *map.get_mut(Zone::Top) = 0;
        let collected: Vec<_> = map.iter().map(|(z, v)| (z, *v)).collect();
        assert_eq!(
            collected,
            vec![(Zone::Top, 0), (Zone::Center, 6), (Zone::Bottom, 6)]
        );
    }
}
