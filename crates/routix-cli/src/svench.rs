// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Svench preset: the props a Svench UI expects on every route entry.
//!
//! Files get `id`, `ext`, `dir`, `segment`, `sortKey`, `title`,
//! `canonical`, `options` and `views`; directories get the naming props
//! only. Tree children are ordered by `sortKey`.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use routix::{Options, Parse, Parsed, RouteItem, RoutixError};
use serde_json::{json, Value};
use std::cmp::Ordering;

lazy_static! {
    /// Matches `<View name="...">` (single or double quotes).
    static ref VIEW_RE: Regex =
        Regex::new(r#"<View\b[^>]*?\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
}

/// Parse hook and ordering of the Svench preset.
#[derive(Debug, Clone)]
pub struct SvenchPreset {
    /// Extensions kept in generated titles.
    pub keep_title_extensions: Vec<String>,
}

impl Default for SvenchPreset {
    fn default() -> Self {
        Self {
            keep_title_extensions: vec![".md".to_string()],
        }
    }
}

impl SvenchPreset {
    /// Installs the preset on `options`. Ids move into props, so the top
    /// level `id` field is disabled.
    pub fn apply(self, mut options: Options) -> Options {
        options.id = false;
        options
            .with_parser(self)
            .with_sort_children(compare_sort_keys)
            .with_conflict_resolver(keep_extensions)
    }

    fn title(&self, segment: &str, extension: &str) -> String {
        if self.keep_title_extensions.iter().any(|e| e == extension) {
            format!("{}{}", segment, extension)
        } else {
            segment.to_string()
        }
    }
}

/// Names of the `<View>` components declared in `source`, in order.
pub fn scan_views(source: &str) -> Vec<String> {
    VIEW_RE
        .captures_iter(source)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Splits a route path into its parent directory and last segment.
fn split_path(path: &str) -> (&str, &str) {
    let path = path.trim_start_matches('/');
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

fn sort_key(item: &RouteItem) -> &str {
    item.props
        .get("sortKey")
        .and_then(Value::as_str)
        .unwrap_or(&item.path)
}

fn compare_sort_keys(a: &RouteItem, b: &RouteItem) -> Ordering {
    sort_key(a).cmp(sort_key(b))
}

/// Gives both conflicting files their extension back, so `a.svench` and
/// `a.md` become `/a.svench` and `/a.md`.
fn keep_extensions(new_file: &mut RouteItem, existing: &mut RouteItem) -> bool {
    if new_file.extension == existing.extension {
        return false;
    }
    for item in [new_file, existing] {
        item.path.push_str(&item.extension);
        item.props.insert("canonical".into(), json!(item.path));
    }
    true
}

#[async_trait]
impl Parse for SvenchPreset {
    async fn parse(
        &self,
        item: &mut RouteItem,
        _previous: Option<&RouteItem>,
        _options: &Options,
    ) -> routix::Result<Parsed> {
        if item.is_root {
            return Ok(Parsed::Keep);
        }

        let (dir, segment) = split_path(&item.path);
        let (dir, segment) = (dir.to_string(), segment.to_string());

        if !item.is_file {
            item.props.insert("dir".into(), json!(dir));
            item.props.insert("segment".into(), json!(segment));
            item.props.insert("sortKey".into(), json!(segment));
            item.props.insert("title".into(), json!(segment));
            item.props.insert("canonical".into(), json!(item.path));
            return Ok(Parsed::Keep);
        }

        let views = if item.extension.ends_with(".md") {
            Vec::new()
        } else {
            let source = tokio::fs::read_to_string(&item.absolute)
                .await
                .map_err(|e| RoutixError::Parse {
                    path: item.relative.clone(),
                    message: e.to_string(),
                })?;
            scan_views(&source)
        };

        item.props.insert("id".into(), json!(item.id));
        item.props.insert("ext".into(), json!(item.extension));
        item.props.insert("dir".into(), json!(dir));
        item.props.insert("segment".into(), json!(segment));
        item.props.insert("sortKey".into(), json!(segment));
        item.props
            .insert("title".into(), json!(self.title(&segment, &item.extension)));
        item.props.insert("canonical".into(), json!(item.path));
        item.props.insert("options".into(), json!({}));
        item.props.insert("views".into(), json!(views));
        Ok(Parsed::Keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_scan_views() {
        let source = r#"
            <View name="primary"><Button /></View>
            <View
              name='with spaces' knobs>
            <View>unnamed</View>
        "#;
        assert_eq!(scan_views(source), vec!["primary", "with spaces"]);
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/Colorpicker"), ("", "Colorpicker"));
        assert_eq!(split_path("/a/b/c"), ("a/b", "c"));
        assert_eq!(split_path("a"), ("", "a"));
    }

    #[tokio::test]
    async fn test_parse_file_props() {
        let temp = tempdir().unwrap();
        let absolute = temp.path().join("Colorpicker.svench");
        fs::write(&absolute, "<View name=\"colorpicker\">x</View>").unwrap();

        let options = Options::new(temp.path());
        let mut item = RouteItem::file("Colorpicker.svench", "/Colorpicker", absolute.clone(), ".svench");
        let parsed = SvenchPreset::default().parse(&mut item, None, &options).await.unwrap();

        assert_eq!(parsed, Parsed::Keep);
        assert_eq!(item.props["id"], json!(item.id));
        assert_eq!(item.props["ext"], json!(".svench"));
        assert_eq!(item.props["dir"], json!(""));
        assert_eq!(item.props["segment"], json!("Colorpicker"));
        assert_eq!(item.props["sortKey"], json!("Colorpicker"));
        assert_eq!(item.props["title"], json!("Colorpicker"));
        assert_eq!(item.props["canonical"], json!("/Colorpicker"));
        assert_eq!(item.props["options"], json!({}));
        assert_eq!(item.props["views"], json!(["colorpicker"]));
    }

    #[tokio::test]
    async fn test_markdown_title_keeps_extension() {
        let options = Options::new("/src");
        let mut item = RouteItem::file("hello.md", "/hello", PathBuf::from("/src/hello.md"), ".md");
        SvenchPreset::default().parse(&mut item, None, &options).await.unwrap();
        assert_eq!(item.props["title"], json!("hello.md"));
        assert_eq!(item.props["views"], json!([]));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_a_parse_error() {
        let options = Options::new("/src");
        let mut item = RouteItem::file("gone.svench", "/gone", PathBuf::from("/nonexistent/gone.svench"), ".svench");
        let err = SvenchPreset::default().parse(&mut item, None, &options).await.unwrap_err();
        assert!(matches!(err, RoutixError::Parse { ref path, .. } if path == "gone.svench"));
    }

    #[tokio::test]
    async fn test_directory_props() {
        let options = Options::new("/src");
        let mut item = RouteItem::directory("/components/forms");
        SvenchPreset::default().parse(&mut item, None, &options).await.unwrap();
        assert_eq!(item.props["dir"], json!("components"));
        assert_eq!(item.props["title"], json!("forms"));
        assert!(item.props.get("views").is_none());
    }

    #[test]
    fn test_conflict_resolution_appends_extensions() {
        let mut a = RouteItem::file("a.svench", "/a", PathBuf::from("/src/a.svench"), ".svench");
        let mut b = RouteItem::file("a.md", "/a", PathBuf::from("/src/a.md"), ".md");
        assert!(keep_extensions(&mut a, &mut b));
        assert_eq!(a.path, "/a.svench");
        assert_eq!(b.path, "/a.md");

        let mut c = RouteItem::file("a.md", "/a", PathBuf::from("/other/a.md"), ".md");
        assert!(!keep_extensions(&mut b, &mut c));
    }
}
