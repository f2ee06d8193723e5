//! Moving extracted license comments into a companion asset.

use minim_config::Banner;

/// Expands a comments file name template for `asset`.
///
/// `[file]` is the asset name without its query string, `[query]` the query
/// including `?` (or nothing), and `[base]` the last path segment of `[file]`.
pub fn comments_filename(template: &str, asset: &str) -> String {
    let (file, query) = match asset.find('?') {
        Some(i) => asset.split_at(i),
        None => (asset, ""),
    };
    let base = file.rsplit('/').next().unwrap_or(file);
    template
        .replace("[file]", file)
        .replace("[query]", query)
        .replace("[base]", base)
}

/// The banner comment for `asset` pointing at `comments_file`, or `None` when
/// the banner is disabled.
///
/// Custom text is wrapped in `/*! ... */` and may span several lines.
pub fn banner_for(banner: &Banner, asset: &str, comments_file: &str) -> Option<String> {
    match banner {
        Banner::Toggle(false) => None,
        Banner::Toggle(true) => Some(format!(
            "/*! For license information please see {} */",
            relative_path(asset, comments_file)
        )),
        Banner::Text(text) => Some(format!("/*! {text} */")),
    }
}

/// Joins comments into the companion file's content.
///
/// Duplicates are dropped, keeping first occurrence order. Comments are
/// separated by a blank line and the file ends with a newline.
pub fn render_comments<'a>(comments: impl IntoIterator<Item = &'a String>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for comment in comments {
        let trimmed = comment.trim();
        if !trimmed.is_empty() && !seen.contains(&trimmed) {
            seen.push(trimmed);
        }
    }
    let mut out = seen.join("\n\n");
    out.push('\n');
    out
}

/// Path of `target` relative to the directory containing `from`.
fn relative_path(from: &str, target: &str) -> String {
    let from = from.split('?').next().unwrap_or(from);
    let from_dirs: Vec<&str> = from.split('/').collect();
    let from_dirs = &from_dirs[..from_dirs.len().saturating_sub(1)];
    let target_parts: Vec<&str> = target.split('/').collect();

    let common = from_dirs
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count()
        .min(target_parts.len().saturating_sub(1));

    let mut parts: Vec<&str> = vec![".."; from_dirs.len() - common];
    parts.extend(&target_parts[common..]);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_default_template() {
        assert_eq!(comments_filename("[file].LICENSE", "main.js"), "main.js.LICENSE");
        assert_eq!(
            comments_filename("[file].LICENSE", "js/main.js?v=1"),
            "js/main.js.LICENSE"
        );
    }

    #[test]
    fn filename_query_and_base() {
        assert_eq!(
            comments_filename("licenses/[base].txt[query]", "js/main.js?v=1"),
            "licenses/main.js.txt?v=1"
        );
    }

    #[test]
    fn banner_points_at_sibling() {
        assert_eq!(
            banner_for(&Banner::Toggle(true), "js/main.js", "js/main.js.LICENSE").unwrap(),
            "/*! For license information please see main.js.LICENSE */"
        );
    }

    #[test]
    fn banner_points_across_directories() {
        assert_eq!(
            banner_for(&Banner::Toggle(true), "js/app/main.js", "licenses/main.txt").unwrap(),
            "/*! For license information please see ../../licenses/main.txt */"
        );
        assert_eq!(
            banner_for(&Banner::Toggle(true), "main.js", "licenses/main.txt").unwrap(),
            "/*! For license information please see licenses/main.txt */"
        );
    }

    #[test]
    fn banner_disabled_or_custom() {
        assert!(banner_for(&Banner::Toggle(false), "a.js", "a.js.LICENSE").is_none());
        assert_eq!(
            banner_for(&Banner::Text("see NOTICE".into()), "a.js", "a.js.LICENSE").unwrap(),
            "/*! see NOTICE */"
        );
    }

    #[test]
    fn multi_line_banner_stays_one_comment() {
        let banner =
            banner_for(&Banner::Text("Licensed under MIT\nsee NOTICE".into()), "a.js", "x").unwrap();
        assert_eq!(banner, "/*! Licensed under MIT\nsee NOTICE */");
        assert_eq!(banner.lines().count(), 2);
    }

    #[test]
    fn render_dedupes_in_order() {
        let comments = vec![
            "/*! MIT License */".to_string(),
            "/*! @license Apache-2.0 */".to_string(),
            "/*! MIT License */".to_string(),
        ];
        assert_eq!(
            render_comments(&comments),
            "/*! MIT License */\n\n/*! @license Apache-2.0 */\n"
        );
    }
}
