//! The FILTER stage: choosing which assets a build minifies.

use minim_config::RuleSet;

use crate::asset::{Asset, AssetSet};

/// Snapshots the assets `rules` select, in the set's iteration order.
///
/// Assets already marked as minimized are skipped, so running a build twice
/// over the same set does not minify anything twice.
pub fn select_assets(assets: &dyn AssetSet, rules: &RuleSet) -> Vec<(String, Asset)> {
    assets
        .names()
        .into_iter()
        .filter(|name| rules.matches(name))
        .filter_map(|name| {
            let asset = assets.get(&name)?;
            (!asset.minimized).then_some((name, asset))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssetSet;

    fn rules(test: &[&str], include: &[&str], exclude: &[&str]) -> RuleSet {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        RuleSet::parse(&owned(test), &owned(include), &owned(exclude)).unwrap()
    }

    fn set() -> MemoryAssetSet {
        ["a.js", "b.mjs", "c.css", "vendor/d.js", "e.js?ver=2"]
            .into_iter()
            .map(|n| (n, Asset::new(format!("/* {n} */"))))
            .collect()
    }

    fn names(selected: Vec<(String, Asset)>) -> Vec<String> {
        selected.into_iter().map(|(n, _)| n).collect()
    }

    #[test]
    fn default_test_selects_scripts() {
        let selected = select_assets(&set(), &rules(&[r"/\.m?js(\?.*)?$/i"], &[], &[]));
        assert_eq!(names(selected), ["a.js", "b.mjs", "e.js?ver=2", "vendor/d.js"]);
    }

    #[test]
    fn include_and_exclude() {
        let selected = select_assets(&set(), &rules(&[r"/\.js/"], &["vendor/", "a"], &["a.js"]));
        assert_eq!(names(selected), ["vendor/d.js"]);
    }

    #[test]
    fn minimized_assets_are_skipped() {
        let mut set = set();
        set.replace(
            "a.js",
            Asset {
                minimized: true,
                ..Asset::new("a")
            },
        );
        let selected = select_assets(&set, &rules(&[r"/\.js$/"], &[], &[]));
        assert_eq!(names(selected), ["vendor/d.js"]);
    }

    #[test]
    fn snapshot_carries_content() {
        let selected = select_assets(&set(), &rules(&["c."], &[], &[]));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].1.content, "/* c.css */");
    }
}
