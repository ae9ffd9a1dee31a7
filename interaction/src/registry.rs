//! Known locations of the INTERACTION dataset, and which ones each split covers.

pub const LOCATIONS: [&str; 18] = [
    "DR_CHN_Merging_ZS0",
    "DR_CHN_Merging_ZS2",
    "DR_CHN_Roundabout_LN",
    "DR_DEU_Merging_MT",
    "DR_DEU_Roundabout_OF",
    "DR_Intersection_CM",
    "DR_LaneChange_ET0",
    "DR_LaneChange_ET1",
    "DR_Merging_TR0",
    "DR_Merging_TR1",
    "DR_Roundabout_RW",
    "DR_USA_Intersection_EP0",
    "DR_USA_Intersection_EP1",
    "DR_USA_Intersection_GL",
    "DR_USA_Intersection_MA",
    "DR_USA_Roundabout_EP",
    "DR_USA_Roundabout_FT",
    "DR_USA_Roundabout_SR",
];

const TRAIN_VAL: &[&str] = &[
    "DR_CHN_Merging_ZS0",
    "DR_CHN_Merging_ZS2",
    "DR_CHN_Roundabout_LN",
    "DR_DEU_Merging_MT",
    "DR_DEU_Roundabout_OF",
    "DR_USA_Intersection_EP0",
    "DR_USA_Intersection_EP1",
    "DR_USA_Intersection_GL",
    "DR_USA_Intersection_MA",
    "DR_USA_Roundabout_EP",
    "DR_USA_Roundabout_FT",
    "DR_USA_Roundabout_SR",
];

const TEST: &[&str] = &[
    "DR_CHN_Merging_ZS0",
    "DR_CHN_Merging_ZS2",
    "DR_DEU_Merging_MT",
    "DR_DEU_Roundabout_OF",
    "DR_Intersection_CM",
    "DR_LaneChange_ET0",
    "DR_LaneChange_ET1",
    "DR_Merging_TR0",
    "DR_Merging_TR1",
    "DR_Roundabout_RW",
    "DR_USA_Intersection_EP0",
    "DR_USA_Intersection_EP1",
    "DR_USA_Intersection_GL",
    "DR_USA_Intersection_MA",
    "DR_USA_Roundabout_EP",
    "DR_USA_Roundabout_FT",
    "DR_USA_Roundabout_SR",
];

// The conditional tracks drop a few locations
const TEST_CONDITIONAL: &[&str] = &[
    "DR_CHN_Merging_ZS0",
    "DR_CHN_Merging_ZS2",
    "DR_DEU_Merging_MT",
    "DR_DEU_Roundabout_OF",
    "DR_Intersection_CM",
    "DR_LaneChange_ET1",
    "DR_Merging_TR0",
    "DR_Roundabout_RW",
    "DR_USA_Intersection_EP0",
    "DR_USA_Intersection_EP1",
    "DR_USA_Intersection_GL",
    "DR_USA_Intersection_MA",
    "DR_USA_Roundabout_EP",
    "DR_USA_Roundabout_FT",
    "DR_USA_Roundabout_SR",
];

/// Split name to the locations it covers, in a fixed order.
pub const SPLITS: [(&str, &[&str]); 6] = [
    ("train", TRAIN_VAL),
    ("val", TRAIN_VAL),
    ("test_multi-agent", TEST),
    ("test_single-agent", TEST),
    ("test_conditional-single-agent", TEST_CONDITIONAL),
    ("test_conditional-multi-agent", TEST_CONDITIONAL),
];

pub fn split_names() -> Vec<&'static str> {
    SPLITS.iter().map(|(name, _)| *name).collect()
}

pub fn split_locations(split: &str) -> Option<&'static [&'static str]> {
    SPLITS
        .iter()
        .find(|(name, _)| *name == split)
        .map(|(_, locations)| *locations)
}

pub fn is_valid_location(location: &str) -> bool {
    LOCATIONS.contains(&location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_split_uses_known_locations() {
        for (name, locations) in SPLITS {
            assert!(!locations.is_empty(), "{name} is empty");
            for location in locations {
                assert!(is_valid_location(location), "{name} has {location}");
            }
        }
    }

    #[test]
    fn lookups() {
        assert_eq!(split_names().len(), 6);
        assert_eq!(split_locations("train").unwrap().len(), 12);
        assert_eq!(split_locations("test_single-agent").unwrap().len(), 17);
        assert_eq!(
            split_locations("test_conditional-multi-agent")
                .unwrap()
                .len(),
            15
        );
        assert!(split_locations("test").is_none());
        assert!(!split_locations("val")
            .unwrap()
            .contains(&"DR_Intersection_CM"));
        assert!(!is_valid_location("DR_Nowhere"));
    }
}
