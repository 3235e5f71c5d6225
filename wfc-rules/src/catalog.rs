//! N×N pattern extraction with symmetry variants, deduplication and weights.

use crate::source::{GridSource, SymmetryMappingSource};
use crate::types::{Category, TileDictionary, TileId};
use log::{debug, info};
use std::collections::HashMap;
use thiserror::Error;

/// Configuration errors raised while building a catalog. All of them are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No sample grid was supplied.
    #[error("No sample grids supplied.")]
    NoSamples,
    /// A sample grid has zero width or height.
    #[error("Sample {0} is empty.")]
    EmptySample(usize),
    /// The pattern size is zero.
    #[error("Pattern size must be at least 1.")]
    InvalidPatternSize,
    /// The pattern does not fit inside a sample.
    #[error("Pattern size {size} exceeds sample {index} dimensions {width}x{height}.")]
    PatternLargerThanSample {
        size: usize,
        index: usize,
        width: usize,
        height: usize,
    },
    /// Symmetry must select between 1 and 8 variants.
    #[error("Symmetry must be between 1 and 8, got {0}.")]
    InvalidSymmetry(usize),
    /// A rotate/reflect mapping points at a tile that never occurs in the samples.
    #[error("Symmetry mapping for tile {from:?} targets unknown tile {to:?}.")]
    UnknownSymmetryTarget { from: TileId, to: TileId },
    /// `C^(N*N)` overflows the radix hash.
    #[error("{categories} categories with pattern size {size} exceed the pattern hash capacity.")]
    HashCapacity { categories: usize, size: usize },
    /// More distinct tiles than categories can represent.
    #[error("Samples contain more than {0} distinct tiles.")]
    TooManyCategories(usize),
    /// A pattern ended up with a non-positive weight.
    #[error("Pattern {0} has zero weight.")]
    ZeroWeight(usize),
}

/// A sample translated into categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Category>,
}

impl CategoryGrid {
    /// Reads with wrap-around, so periodic anchors can be extracted directly.
    #[inline]
    fn get_wrapped(&self, x: usize, y: usize) -> Category {
        self.cells[(x % self.width) + (y % self.height) * self.width]
    }
}

/// Category-level rotate/reflect maps. Undefined entries map to themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetryMap {
    rotate: Vec<Category>,
    reflect: Vec<Category>,
}

impl SymmetryMap {
    /// The identity map over `category_count` categories.
    pub fn identity(category_count: usize) -> Self {
        let ids: Vec<Category> = (0..category_count)
            .map(|i| Category(i as u16))
            .collect();
        Self {
            rotate: ids.clone(),
            reflect: ids,
        }
    }

    /// Translates a tile-level mapping into category space.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UnknownSymmetryTarget` if a known tile maps to a tile
    /// that is not in the dictionary.
    pub fn from_source(
        dictionary: &TileDictionary,
        source: &dyn SymmetryMappingSource,
    ) -> Result<Self, CatalogError> {
        let mut map = Self::identity(dictionary.len());
        for (index, &tile) in dictionary.tiles().iter().enumerate() {
            if let Some(target) = source.rotated(tile) {
                map.rotate[index] = dictionary.category(target).ok_or(
                    CatalogError::UnknownSymmetryTarget {
                        from: tile,
                        to: target,
                    },
                )?;
            }
            if let Some(target) = source.reflected(tile) {
                map.reflect[index] = dictionary.category(target).ok_or(
                    CatalogError::UnknownSymmetryTarget {
                        from: tile,
                        to: target,
                    },
                )?;
            }
        }
        Ok(map)
    }

    #[inline]
    pub fn rotate(&self, category: Category) -> Category {
        self.rotate.get(category.index()).copied().unwrap_or(category)
    }

    #[inline]
    pub fn reflect(&self, category: Category) -> Category {
        self.reflect
            .get(category.index())
            .copied()
            .unwrap_or(category)
    }
}

/// An N×N block of categories, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    size: usize,
    cells: Vec<Category>,
}

impl Pattern {
    /// Builds a pattern by evaluating `f(x, y)` for every offset.
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> Category) -> Self {
        let mut cells = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                cells.push(f(x, y));
            }
        }
        Self { size, cells }
    }

    /// Side length N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Category at offset `(x, y)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Category {
        self.cells[x + y * self.size]
    }

    pub fn cells(&self) -> &[Category] {
        &self.cells
    }

    /// Quarter turn: `rotate(P)(x, y) = remap_rotate(P(N-1-y, x))`.
    pub fn rotated(&self, map: &SymmetryMap) -> Self {
        let n = self.size;
        Self::from_fn(n, |x, y| map.rotate(self.get(n - 1 - y, x)))
    }

    /// Mirror: `reflect(P)(x, y) = remap_reflect(P(N-1-x, y))`.
    pub fn reflected(&self, map: &SymmetryMap) -> Self {
        let n = self.size;
        Self::from_fn(n, |x, y| map.reflect(self.get(n - 1 - x, y)))
    }

    /// The eight symmetry variants in catalog order: identity, reflect, rotate,
    /// reflect∘rotate, rotate², reflect∘rotate², rotate³, reflect∘rotate³.
    pub fn variants(&self, map: &SymmetryMap) -> [Self; 8] {
        let r1 = self.rotated(map);
        let r2 = r1.rotated(map);
        let r3 = r2.rotated(map);
        [
            self.clone(),
            self.reflected(map),
            r1.clone(),
            r1.reflected(map),
            r2.clone(),
            r2.reflected(map),
            r3.clone(),
            r3.reflected(map),
        ]
    }

    /// Positional radix hash `Σ cells[i] · base^i`.
    ///
    /// Collision-free as long as `base` is at least the category count and
    /// `base^(N*N)` fits in `u128`; see [`hash_capacity_ok`].
    pub fn radix_hash(&self, base: u128) -> u128 {
        let mut result = 0u128;
        let mut power = 1u128;
        for category in &self.cells {
            result = result.wrapping_add(u128::from(category.0).wrapping_mul(power));
            power = power.wrapping_mul(base);
        }
        result
    }
}

/// Whether the radix hash of N×N patterns over `categories` symbols stays exact.
pub fn hash_capacity_ok(categories: usize, size: usize) -> bool {
    let base = categories.max(1) as u128;
    u32::try_from(size * size)
        .ok()
        .and_then(|digits| base.checked_pow(digits))
        .is_some()
}

/// Options controlling pattern extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogOptions {
    /// Pattern side length N.
    pub pattern_size: usize,
    /// Whether anchors wrap around the sample edges.
    pub periodic_input: bool,
    /// Number of symmetry variants kept per anchor (1, 2, 4 or 8).
    pub symmetry: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            pattern_size: 2,
            periodic_input: true,
            symmetry: 8,
        }
    }
}

impl CatalogOptions {
    fn validate(&self) -> Result<(), CatalogError> {
        if self.pattern_size == 0 {
            return Err(CatalogError::InvalidPatternSize);
        }
        if !(1..=8).contains(&self.symmetry) {
            return Err(CatalogError::InvalidSymmetry(self.symmetry));
        }
        Ok(())
    }
}

/// Extracts deduplicated patterns and their occurrence weights from category samples.
///
/// # Errors
///
/// Returns a `CatalogError` for any configuration problem; see the variants.
pub fn build_patterns(
    samples: &[CategoryGrid],
    options: &CatalogOptions,
    symmetry: &SymmetryMap,
    category_count: usize,
) -> Result<(Vec<Pattern>, Vec<f64>), CatalogError> {
    options.validate()?;
    if samples.is_empty() {
        return Err(CatalogError::NoSamples);
    }
    let n = options.pattern_size;
    if !hash_capacity_ok(category_count, n) {
        return Err(CatalogError::HashCapacity {
            categories: category_count,
            size: n,
        });
    }
    let base = category_count.max(1) as u128;

    let mut patterns = Vec::new();
    let mut weights: Vec<f64> = Vec::new();
    let mut indices: HashMap<u128, usize> = HashMap::new();

    for (index, sample) in samples.iter().enumerate() {
        if sample.width == 0 || sample.height == 0 {
            return Err(CatalogError::EmptySample(index));
        }
        if n > sample.width || n > sample.height {
            return Err(CatalogError::PatternLargerThanSample {
                size: n,
                index,
                width: sample.width,
                height: sample.height,
            });
        }
        let xmax = if options.periodic_input {
            sample.width
        } else {
            sample.width - n + 1
        };
        let ymax = if options.periodic_input {
            sample.height
        } else {
            sample.height - n + 1
        };

        for y in 0..ymax {
            for x in 0..xmax {
                let base_pattern = Pattern::from_fn(n, |dx, dy| sample.get_wrapped(x + dx, y + dy));
                let variants = base_pattern.variants(symmetry);
                for pattern in variants.into_iter().take(options.symmetry) {
                    let hash = pattern.radix_hash(base);
                    if let Some(&existing) = indices.get(&hash) {
                        weights[existing] += 1.0;
                    } else {
                        indices.insert(hash, weights.len());
                        weights.push(1.0);
                        patterns.push(pattern);
                    }
                }
            }
        }
    }

    if let Some(index) = weights.iter().position(|&w| w <= 0.0) {
        return Err(CatalogError::ZeroWeight(index));
    }
    debug!(
        "Extracted {} patterns (N={}, symmetry={}) from {} samples",
        patterns.len(),
        n,
        options.symmetry,
        samples.len()
    );
    Ok((patterns, weights))
}

/// The immutable pattern catalog of one model.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    options: CatalogOptions,
    dictionary: TileDictionary,
    symmetry: SymmetryMap,
    patterns: Vec<Pattern>,
    weights: Vec<f64>,
}

impl PatternCatalog {
    /// Scans the sources into categories, resolves the symmetry mapping and extracts patterns.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if there are no sources, a source is empty or smaller
    /// than the pattern, the symmetry mapping is malformed, or the options are invalid.
    pub fn from_sources(
        sources: &[&dyn GridSource],
        symmetry_source: &dyn SymmetryMappingSource,
        options: CatalogOptions,
    ) -> Result<Self, CatalogError> {
        options.validate()?;
        if sources.is_empty() {
            return Err(CatalogError::NoSamples);
        }

        let mut dictionary = TileDictionary::new();
        let mut samples = Vec::with_capacity(sources.len());
        for source in sources {
            let (width, height) = (source.width(), source.height());
            let mut cells = Vec::with_capacity(width * height);
            for y in 0..height {
                for x in 0..width {
                    let category = dictionary
                        .category_or_insert(source.tile_at(x, y))
                        .ok_or(CatalogError::TooManyCategories(usize::from(u16::MAX)))?;
                    cells.push(category);
                }
            }
            samples.push(CategoryGrid {
                width,
                height,
                cells,
            });
        }

        let symmetry = SymmetryMap::from_source(&dictionary, symmetry_source)?;
        let (patterns, weights) = build_patterns(&samples, &options, &symmetry, dictionary.len())?;
        info!(
            "Pattern catalog ready: {} categories, {} patterns",
            dictionary.len(),
            patterns.len()
        );

        Ok(Self {
            options,
            dictionary,
            symmetry,
            patterns,
            weights,
        })
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Occurrence counts, indexed like [`Self::patterns`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn dictionary(&self) -> &TileDictionary {
        &self.dictionary
    }

    pub fn symmetry(&self) -> &SymmetryMap {
        &self.symmetry
    }

    pub fn options(&self) -> &CatalogOptions {
        &self.options
    }

    pub fn pattern_size(&self) -> usize {
        self.options.pattern_size
    }

    /// Number of patterns T.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
