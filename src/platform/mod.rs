// eglctx/src/platform/mod.rs
//
//! Platform backends.

pub mod generic;
