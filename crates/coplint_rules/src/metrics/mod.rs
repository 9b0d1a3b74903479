//! Size and complexity limits.

pub mod block_nesting;
