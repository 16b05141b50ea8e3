use super::listing::Listing;

/// How a [`PriceRange`] bound relates to the raw on-chain price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceUnit {
    /// Bounds are in the smallest on-chain unit.
    #[default]
    Raw,
    /// Bounds are in whole units; the raw price is divided by `divisor` first.
    Scaled { divisor: u64 },
}

impl PriceUnit {
    pub fn convert(&self, raw: u64) -> f64 {
        match self {
            PriceUnit::Raw => raw as f64,
            PriceUnit::Scaled { divisor } => raw as f64 / (*divisor).max(1) as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

// 2^64, the first f64 above every u64
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

impl PriceRange {
    pub fn is_unset(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Inclusive on both ends; a missing bound is open.
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Same as [`contains`](Self::contains) for an integer price, compared
    /// without going through `f64`.
    pub fn contains_raw(&self, price: u64) -> bool {
        let above_min = self.min.map_or(true, |min| {
            if min.is_nan() || min >= U64_LIMIT {
                false
            } else if min <= 0.0 {
                true
            } else {
                price >= min.ceil() as u64
            }
        });
        let below_max = self.max.map_or(true, |max| {
            if max.is_nan() || max < 0.0 {
                false
            } else if max >= U64_LIMIT {
                true
            } else {
                price <= max.floor() as u64
            }
        });
        above_min && below_max
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub collection: String,
    pub collection_category: String,
    pub category: String,
    pub kind: String,
    pub price_range: PriceRange,
    pub price_unit: PriceUnit,
    pub include_inactive: bool,
}

fn label_matches(wanted: &str, actual: &str) -> bool {
    wanted.is_empty() || wanted == actual
}

impl FilterState {
    pub fn collection(mut self, value: impl Into<String>) -> Self {
        self.collection = value.into();
        self
    }

    pub fn collection_category(mut self, value: impl Into<String>) -> Self {
        self.collection_category = value.into();
        self
    }

    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.category = value.into();
        self
    }

    pub fn kind(mut self, value: impl Into<String>) -> Self {
        self.kind = value.into();
        self
    }

    pub fn price_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_range = PriceRange { min, max };
        self
    }

    pub fn price_unit(mut self, unit: PriceUnit) -> Self {
        self.price_unit = unit;
        self
    }

    pub fn include_inactive(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }

    /// True when no predicate would reject an active listing.
    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
            && self.collection_category.is_empty()
            && self.category.is_empty()
            && self.kind.is_empty()
            && self.price_range.is_unset()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if !self.include_inactive && !listing.is_active {
            return false;
        }
        if !label_matches(&self.collection, &listing.collection) {
            return false;
        }
        if !label_matches(&self.collection_category, &listing.collection_category) {
            return false;
        }
        if !label_matches(&self.category, &listing.category) {
            return false;
        }
        if !label_matches(&self.kind, &listing.kind) {
            return false;
        }
        match self.price_unit {
            PriceUnit::Raw => self.price_range.contains_raw(listing.price),
            PriceUnit::Scaled { .. } => self.price_range.contains(self.price_unit.convert(listing.price)),
        }
    }
}
