// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render objects, painting and compositing layers for retained-mode
//! rendering.
//!
//! `lamina_core` turns a tree of mutable layout/paint nodes into a tree of
//! compositing layers holding recorded pictures, doing only the work the
//! last round of mutations made necessary. It is `no_std` compatible (with
//! `alloc`) and stores both trees as struct-of-arrays with generational
//! index handles.
//!
//! # Architecture
//!
//! Each frame runs three flushes over the render tree and hands the
//! resulting layer tree to a compositor (see `lamina_raster`):
//!
//! ```text
//!   mutations (adopt / drop / mark_needs_*)
//!       │
//!       ▼
//!   RenderTree::flush_layout()            relayout roots, shallow first
//!       │
//!       ▼
//!   RenderTree::flush_compositing_bits()  bottom-up
//!       │
//!       ▼
//!   RenderTree::flush_paint()             layer owners, deep first
//!       │          │
//!       │          └──► PaintingContext ──► PictureRecorder ──► Picture
//!       ▼
//!   LayerTree (root_layer) ──► compositor
//! ```
//!
//! **[`render`]**: The render tree, layout protocols, dirty marking,
//! relayout roots, the three flushes and per-node failure isolation.
//!
//! **[`painting`]**: [`PaintingContext`](painting::PaintingContext), which
//! splits a subtree's drawing into picture layers and composited child
//! layers.
//!
//! **[`layer`]**: Struct-of-arrays compositing layer tree with generational
//! handles.
//!
//! **[`picture`]**: The [`Canvas`](picture::Canvas) drawing contract,
//! recorded [`Picture`](picture::Picture)s and GPU-backed
//! [`Image`](picture::Image)s.
//!
//! **[`dirty`]**: The `understory_dirty` channel used for compositing-bit
//! invalidation.
//!
//! **[`time`]**: Host time, clocks and the frame stopwatch.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pipeline instrumentation, with the zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   layout and repaint events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod layer;
pub mod painting;
pub mod picture;
pub mod render;
pub mod time;
pub mod trace;
