//! Social network clients and the fetch pipeline used by trawl.
//!
//! Only the Twitter/X source exists: a cookie-authenticated session, the mapping from
//! raw timeline items to [`trawl_common::PostRecord`], and the keyword fetch/merge
//! pipeline that drives any [`twitter::SearchSession`].
pub mod twitter;
