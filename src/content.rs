//! Read-only content snapshot.
//!
//! The admin tooling owns the content and writes it out as a JSON document.
//! The gateway loads it once at startup and serves the profile and layout
//! read paths from it. Only the fields that carry images are typed; all
//! other fields are kept as raw JSON and passed through.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::image::ImageNormalizer;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub layouts: Vec<Layout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_image: Option<String>,
    #[serde(default)]
    pub portfolio: Vec<PortfolioItem>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "visible")]
    pub is_visible: bool,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

fn visible() -> bool {
    true
}

// type, title, y, h of the default widgets, stacked full width in this order
const DEFAULT_WIDGETS: [(&str, &str, i64, i64); 5] = [
    ("hero", "Hero Section", 0, 6),
    ("about", "About Section", 6, 4),
    ("education", "Education & Experience", 10, 5),
    ("portfolio", "Portfolio", 15, 4),
    ("contact", "Contact", 19, 5),
];

impl Layout {
    /// The layout served when no layout is active. It has id 0 and is never
    /// written back to the snapshot.
    pub fn fallback() -> Self {
        let widgets = DEFAULT_WIDGETS
            .iter()
            .zip(0..)
            .map(|(&(kind, title, y, h), order)| {
                let mut rest = Map::new();
                rest.insert("type".into(), kind.into());
                rest.insert("title".into(), title.into());
                rest.insert("x".into(), 0_i64.into());
                rest.insert("y".into(), y.into());
                rest.insert("w".into(), 12_i64.into());
                rest.insert("h".into(), h.into());
                Widget {
                    image_url: None,
                    order,
                    is_visible: true,
                    rest,
                }
            })
            .collect();

        let mut rest = Map::new();
        rest.insert("name".into(), "Default Layout".into());
        Layout {
            id: 0,
            is_active: true,
            widgets,
            rest,
        }
    }
}

impl ContentSnapshot {
    /// Load the snapshot, treating a missing file as empty content.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "content file not found, serving empty content");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        let snapshot: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(
            path = %path.display(),
            profile = snapshot.profile.is_some(),
            layouts = snapshot.layouts.len(),
            "content loaded"
        );
        Ok(snapshot)
    }

    /// The profile with every image field in proxy form.
    pub fn profile(&self, normalizer: &ImageNormalizer) -> Option<Profile> {
        let mut profile = self.profile.clone()?;
        normalizer.normalize_field(&mut profile.hero_image);
        normalizer.normalize_field(&mut profile.contact_image);
        for item in &mut profile.portfolio {
            normalizer.normalize_field(&mut item.image);
        }
        Some(profile)
    }

    /// The first active layout, or [`Layout::fallback`] when none is. Widgets
    /// are ordered and hidden ones dropped unless `include_hidden`.
    pub fn active_layout(&self, normalizer: &ImageNormalizer, include_hidden: bool) -> Layout {
        let mut layout = match self.layouts.iter().find(|l| l.is_active) {
            Some(layout) => layout.clone(),
            None => {
                debug!("no active layout, serving the default");
                Layout::fallback()
            }
        };
        if !include_hidden {
            layout.widgets.retain(|w| w.is_visible);
        }
        prepare_widgets(&mut layout.widgets, normalizer);
        layout
    }

    pub fn widgets(&self, normalizer: &ImageNormalizer, layout_id: i64) -> Option<Vec<Widget>> {
        let mut widgets = self.layouts.iter().find(|l| l.id == layout_id)?.widgets.clone();
        prepare_widgets(&mut widgets, normalizer);
        Some(widgets)
    }
}

fn prepare_widgets(widgets: &mut [Widget], normalizer: &ImageNormalizer) {
    widgets.sort_by_key(|w| w.order);
    for widget in widgets {
        normalizer.normalize_field(&mut widget.image_url);
    }
}
