//! Ordering and fixed-size pagination of fetched records.

use feruca::Collator;
use serde::{Deserialize, Serialize};

use crate::error::PageError;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// String field used to order listings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Title,
    Description,
    Recipient,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "recipient" => Ok(Self::Recipient),
            other => Err(format!("unknown sort key `{other}`")),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order `{other}`")),
        }
    }
}

/// Stable sort by a string field under the CLDR root collation.
///
/// Accents sort with their base letter, case only breaks ties, and punctuation
/// and spaces are shifted out of the primary comparison. Identical values keep
/// their input order.
pub fn order_by<T, F>(items: &mut [T], order: SortOrder, value: F)
where
    F: Fn(&T) -> &str,
{
    let mut collator = Collator::default();
    items.sort_by(|a, b| {
        let ord = collator.collate(value(a), value(b));
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Returns page `page_number` (1-indexed) of `items`.
///
/// Pages past the end, and page 0, are empty rather than an error.
pub fn paginate<T>(items: &[T], page_number: usize, page_size: usize) -> Result<&[T], PageError> {
    if page_size == 0 {
        return Err(PageError::InvalidPageSize);
    }
    if page_number == 0 {
        return Ok(&[]);
    }

    let start = (page_number - 1).saturating_mul(page_size);
    if start >= items.len() {
        return Ok(&[]);
    }
    let end = start.saturating_add(page_size).min(items.len());
    Ok(&items[start..end])
}

/// One page of an ordered listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub number: usize,
    pub size: usize,
    pub total: usize,
    pub has_more: bool,
    pub items: Vec<T>,
}

impl<T: Clone> Page<T> {
    pub fn from_slice(items: &[T], number: usize, size: usize) -> Result<Self, PageError> {
        let slice = paginate(items, number, size)?;
        Ok(Self {
            number,
            size,
            total: items.len(),
            has_more: number >= 1 && number < page_count(items.len(), size),
            items: slice.to_vec(),
        })
    }
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            number: self.number,
            size: self.size,
            total: self.total,
            has_more: self.has_more,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
