//! History query shapes: filter, sort order and page bounds.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::auth::UserId;
use crate::error::LedgerError;
use crate::history::HistoryEntry;
use crate::weather::round_coordinate;

/// Page size when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Hard ceiling on page size.
pub const MAX_PAGE_LIMIT: usize = 100;

// == Filter ==
/// Selects one user's entries, optionally bounded in time and location.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFilter {
    pub user_id: UserId,
    /// Inclusive lower bound on `requested_at`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `requested_at`
    pub to: Option<DateTime<Utc>>,
    /// Matched against the rounded key
    pub lat: Option<f64>,
    /// Matched against the rounded key
    pub lon: Option<f64>,
}

impl HistoryFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            from: None,
            to: None,
            lat: None,
            lon: None,
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn at(mut self, lat: Option<f64>, lon: Option<f64>) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        entry.user_id == self.user_id
            && self.from.map_or(true, |from| entry.requested_at >= from)
            && self.to.map_or(true, |to| entry.requested_at <= to)
            && self
                .lat
                .map_or(true, |lat| round_coordinate(lat) == entry.key.lat())
            && self
                .lon
                .map_or(true, |lon| round_coordinate(lon) == entry.key.lon())
    }
}

// == Sort ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    RequestedAt,
    Lat,
    Lon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Sort specification, written `field` or `-field` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for HistorySort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::RequestedAt,
            order: SortOrder::Descending,
        }
    }
}

impl FromStr for HistorySort {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (order, name) = match s.strip_prefix('-') {
            Some(rest) => (SortOrder::Descending, rest),
            None => (SortOrder::Ascending, s),
        };
        let field = match name {
            "requestedAt" => SortField::RequestedAt,
            "lat" => SortField::Lat,
            "lon" => SortField::Lon,
            _ => {
                return Err(LedgerError::validation(
                    "INVALID_SORT",
                    "Invalid sort field. Allowed: requestedAt, lat, lon (prefix with - for descending)",
                ))
            }
        };
        Ok(Self { field, order })
    }
}

impl HistorySort {
    /// Orders two entries; ties fall back to `requested_at`, then id.
    pub fn compare(&self, a: &HistoryEntry, b: &HistoryEntry) -> Ordering {
        let primary = match self.field {
            SortField::RequestedAt => a.requested_at.cmp(&b.requested_at),
            SortField::Lat => a.key.lat().total_cmp(&b.key.lat()),
            SortField::Lon => a.key.lon().total_cmp(&b.key.lon()),
        };
        let ordered = primary
            .then_with(|| a.requested_at.cmp(&b.requested_at))
            .then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Ascending => ordered,
            SortOrder::Descending => ordered.reverse(),
        }
    }
}

// == Page ==
/// Offset pagination with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Clamps `limit` into `[1, max_limit]`; `max_limit` itself never exceeds
    /// [`MAX_PAGE_LIMIT`].
    pub fn new(skip: usize, limit: usize, max_limit: usize) -> Self {
        let ceiling = max_limit.clamp(1, MAX_PAGE_LIMIT);
        Self {
            skip,
            limit: limit.clamp(1, ceiling),
        }
    }
}

// == Query ==
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub filter: HistoryFilter,
    pub sort: HistorySort,
    pub page: Page,
}

impl HistoryQuery {
    pub fn new(filter: HistoryFilter) -> Self {
        Self {
            filter,
            sort: HistorySort::default(),
            page: Page::default(),
        }
    }

    pub fn sorted(mut self, sort: HistorySort) -> Self {
        self.sort = sort;
        self
    }

    pub fn paged(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}
