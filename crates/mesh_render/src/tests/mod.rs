//! Render cache scenario tests
//!
//! Exercise registry, render objects, gathering and the device together.

mod support;

mod caching;
