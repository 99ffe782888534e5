//! Pass Band Definitions
//!
//! `PassBand` defines the priority bands of the frame graph. Each pass's
//! priority is `band base + offset`; bands are far enough apart that passes
//! inserted later in one band never reorder relative to another band.
//!
//! | Band | Base | Typical Content |
//! |------|------|-----------------|
//! | `Scene` | 0 | Default object pass, extra off-screen scene passes |
//! | `Filter` | 2500 | User full-screen filters ping-ponging the scene color |
//! | `PostProcess` | 5000 | Bloom threshold, blur pyramid, tone mapping |

/// Priority band of a pass.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub enum PassBand {
    Scene,
    Filter,
    PostProcess,
}

impl PassBand {
    /// Priorities available to one band.
    pub const SPAN: i32 = 2500;

    /// Base priority of the band.
    #[inline]
    #[must_use]
    pub const fn base(self) -> i32 {
        match self {
            Self::Scene => 0,
            Self::Filter => 2500,
            Self::PostProcess => 5000,
        }
    }

    /// Priority of the `offset`-th pass in this band.
    #[inline]
    #[must_use]
    pub const fn priority(self, offset: i32) -> i32 {
        self.base() + offset
    }

    /// Priority of the `offset`-th pass, or `None` when the offset falls
    /// outside the band.
    #[must_use]
    pub const fn checked_priority(self, offset: i32) -> Option<i32> {
        if offset >= 0 && offset < Self::SPAN {
            Some(self.base() + offset)
        } else {
            None
        }
    }

    /// Band name (for debugging).
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scene => "Scene",
            Self::Filter => "Filter",
            Self::PostProcess => "PostProcess",
        }
    }
}
