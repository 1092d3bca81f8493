use sotah_model::UnixTimestamp;

/// `<region>/<slug>/<snapshot-epoch>.json.gz` (spec.md Section 4.4).
pub fn raw_auctions_object_name(region: &str, slug: &str, snapshot_epoch: UnixTimestamp) -> String {
    format!("{region}/{slug}/{snapshot_epoch}.json.gz")
}

/// `<region>/<slug>/<week-start-epoch>.json` (spec.md Section 4.4).
pub fn manifest_object_name(region: &str, slug: &str, week_start_epoch: UnixTimestamp) -> String {
    format!("{region}/{slug}/{week_start_epoch}.json")
}

/// `<version>/<icon-basename>.jpg` (spec.md Section 4.4).
pub fn icon_object_name(version: &str, icon_basename: &str) -> String {
    format!("{version}/{icon_basename}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_names() {
        assert_eq!(raw_auctions_object_name("us", "area52", 100), "us/area52/100.json.gz");
        assert_eq!(manifest_object_name("us", "area52", 86400), "us/area52/86400.json");
        assert_eq!(icon_object_name("static", "inv_sword"), "static/inv_sword.jpg");
    }
}
