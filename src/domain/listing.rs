pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;

/// A limit/offset window over a listing. Limits are clamped to
/// `[1, MAX_LIMIT]`; offsets are taken as-is (they only ever skip rows).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }

    pub fn default_window() -> Self {
        Self::new(DEFAULT_LIMIT, 0)
    }

    pub const fn limit(self) -> u32 {
        self.limit
    }

    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Window for topping up a short local result from the external source:
    /// asks for the items the local query could not supply.
    pub fn remainder_after(self, local_count: usize) -> Self {
        let taken = u32::try_from(local_count).unwrap_or(self.limit);
        Self {
            limit: self.limit.saturating_sub(taken).max(1),
            offset: self.offset,
        }
    }
}

/// A total count for a paginated listing. When external results were used to
/// fill the page the total is a heuristic upper bound, not an exact count,
/// and is flagged as such to API consumers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CountEstimate {
    pub total: u64,
    pub approximate: bool,
}

impl CountEstimate {
    pub const fn exact(total: u64) -> Self {
        Self {
            total,
            approximate: false,
        }
    }

    pub const fn approximate(total: u64) -> Self {
        Self {
            total,
            approximate: true,
        }
    }

    pub fn total_pages(&self, limit: u32) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(u64::from(limit.max(1)))
        }
    }
}

/// One page of items plus the (possibly approximate) total behind it.
#[derive(Debug, Clone)]
pub struct BookPage<T> {
    pub items: Vec<T>,
    pub total: CountEstimate,
}
