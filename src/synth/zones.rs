// Copyright 2025 Cowboy AI, LLC.

//! Availability Allocator
//!
//! Deterministic assignment of subnets to zones. An explicit zone index
//! wins; without one, the subnet's position among its siblings is used,
//! giving round-robin spread. Both wrap modulo the zone-list length, so
//! assignment is a pure function of (index-or-position, list length).

/// Catalog of availability zones, fetched once per region
pub trait ZoneCatalog {
    /// Ordered zone names for a region
    fn zones(&self, region: &str) -> Vec<String>;
}

/// Fixed catalog deriving zone names from the region name plus suffixes
///
/// Stands in for the provider's zone data source; the allocator only
/// cares that the list is ordered and stable.
#[derive(Debug, Clone)]
pub struct StaticZoneCatalog {
    suffixes: Vec<String>,
}

impl StaticZoneCatalog {
    pub fn new(suffixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StaticZoneCatalog {
    fn default() -> Self {
        Self::new(["a", "b", "c"])
    }
}

impl ZoneCatalog for StaticZoneCatalog {
    fn zones(&self, region: &str) -> Vec<String> {
        self.suffixes
            .iter()
            .map(|s| format!("{region}{s}"))
            .collect()
    }
}

/// Pick the zone for a subnet
///
/// Returns `None` only for an empty zone list.
pub fn allocate_zone<'a>(
    zones: &'a [String],
    explicit_index: Option<u32>,
    position: usize,
) -> Option<&'a str> {
    if zones.is_empty() {
        return None;
    }

    let index = match explicit_index {
        Some(i) => i as usize,
        None => position,
    };

    Some(zones[index % zones.len()].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn three_zones() -> Vec<String> {
        StaticZoneCatalog::default().zones("eu-1")
    }

    #[test_case(Some(0), 7, "eu-1a"; "explicit index wins over position")]
    #[test_case(Some(4), 0, "eu-1b"; "explicit index wraps")]
    #[test_case(None, 0, "eu-1a"; "position fallback first")]
    #[test_case(None, 5, "eu-1c"; "position fallback wraps")]
    fn test_allocation(explicit: Option<u32>, position: usize, expected: &str) {
        let zones = three_zones();
        assert_eq!(allocate_zone(&zones, explicit, position), Some(expected));
    }

    #[test]
    fn test_empty_zone_list() {
        assert_eq!(allocate_zone(&[], None, 0), None);
    }

    #[test]
    fn test_idempotent_for_fixed_list() {
        let zones = three_zones();
        for position in 0..16 {
            assert_eq!(
                allocate_zone(&zones, None, position),
                allocate_zone(&zones, None, position)
            );
        }
    }
}
