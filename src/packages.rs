//! # Static package metadata catalog.
//!
//! Backs `GET /packages`. The catalog is an in-memory list preloaded with a
//! handful of common packages; search is a case-insensitive substring match
//! over name, description and tags, paged 1-based.

use serde::{Deserialize, Serialize};

/// Metadata for one installable package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub tags: Vec<String>,
}

impl PackageMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("{name} package"),
            version: "latest".to_string(),
            tags: Vec::new(),
            name,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePage {
    pub total: usize,
    pub page: usize,
    pub size: usize,
    pub items: Vec<PackageMetadata>,
}

/// Read-only package catalog.
#[derive(Debug, Clone)]
pub struct PackageCatalog {
    packages: Vec<PackageMetadata>,
}

impl PackageCatalog {
    /// Default page size.
    pub const DEFAULT_PAGE_SIZE: usize = 30;
    /// Largest accepted page size.
    pub const MAX_PAGE_SIZE: usize = 200;

    pub fn new(packages: Vec<PackageMetadata>) -> Self {
        Self { packages }
    }

    /// Filters by `query` (if any) and returns page `page` (1-based) of `size` items.
    ///
    /// `page` is clamped to at least 1 and `size` to `1..=MAX_PAGE_SIZE`.
    pub fn search(&self, query: Option<&str>, page: usize, size: usize) -> PackagePage {
        let page = page.max(1);
        let size = size.clamp(1, Self::MAX_PAGE_SIZE);
        let needle = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let matched: Vec<&PackageMetadata> = self
            .packages
            .iter()
            .filter(|p| needle.as_deref().is_none_or(|n| p.matches(n)))
            .collect();

        let items = matched
            .iter()
            .skip((page - 1).saturating_mul(size))
            .take(size)
            .map(|p| (*p).clone())
            .collect();

        PackagePage {
            total: matched.len(),
            page,
            size,
            items,
        }
    }
}

impl Default for PackageCatalog {
    /// `vim`, `git`, `curl`, `htop`, `nginx`.
    fn default() -> Self {
        Self::new(
            ["vim", "git", "curl", "htop", "nginx"]
                .into_iter()
                .map(PackageMetadata::new)
                .collect(),
        )
    }
}
