use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An inquiry submitted through the public contact form.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Contact {
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub service: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub web: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TechStack {
    #[serde(rename = "_id", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
}

/// Body of `GET /techStack`.
#[derive(Debug, Deserialize, Default)]
pub struct TechStackList {
    #[serde(default, rename = "techStack", deserialize_with = "null_as_default")]
    pub tech_stack: Vec<TechStack>,
}

/// An image slot: nothing yet, an already uploaded URL, or a local file that
/// still has to be uploaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ImageRef {
    #[default]
    Empty,
    Remote(String),
    Pending(PathBuf),
}

impl ImageRef {
    pub fn is_pending(&self) -> bool {
        matches!(self, ImageRef::Pending(_))
    }

    pub fn pending_path(&self) -> Option<&PathBuf> {
        match self {
            ImageRef::Pending(path) => Some(path),
            _ => None,
        }
    }

    /// Short human label for the form.
    pub fn label(&self) -> String {
        match self {
            ImageRef::Empty => "No image".to_string(),
            ImageRef::Remote(url) => url.clone(),
            ImageRef::Pending(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

impl From<Option<String>> for ImageRef {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(url) if !url.trim().is_empty() => ImageRef::Remote(url),
            _ => ImageRef::Empty,
        }
    }
}

impl From<ImageRef> for Option<String> {
    fn from(value: ImageRef) -> Self {
        match value {
            ImageRef::Empty => None,
            ImageRef::Remote(url) => Some(url),
            ImageRef::Pending(path) => Some(path.display().to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SectionItem {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub image: ImageRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Approach,
    Process,
    Why,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Approach, Section::Process, Section::Why];

    /// Field name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Approach => "approach",
            Section::Process => "process",
            Section::Why => "why",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Section::Approach => "Approach",
            Section::Process => "Process",
            Section::Why => "Why",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Title,
    Description,
}

/// A service page. `id` is `None` for a draft that has never been saved.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(rename = "mainServiceImage")]
    pub main_service_image: ImageRef,
    #[serde(deserialize_with = "null_as_default")]
    pub tools: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub approach: Vec<SectionItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub process: Vec<SectionItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub why: Vec<SectionItem>,
}

impl Service {
    /// A fresh draft with one blank item per section.
    pub fn blank() -> Self {
        Self {
            approach: vec![SectionItem::default()],
            process: vec![SectionItem::default()],
            why: vec![SectionItem::default()],
            ..Self::default()
        }
    }

    pub fn section(&self, section: Section) -> &[SectionItem] {
        match section {
            Section::Approach => &self.approach,
            Section::Process => &self.process,
            Section::Why => &self.why,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<SectionItem> {
        match section {
            Section::Approach => &mut self.approach,
            Section::Process => &mut self.process,
            Section::Why => &mut self.why,
        }
    }

    /// Tool identifiers, splitting entries the server stored comma-joined.
    pub fn tool_ids(&self) -> impl Iterator<Item = &str> {
        self.tools
            .iter()
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
