// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indented text dumps of the render tree and the layer tree.
//!
//! One line per node, children indented by two spaces under their parent:
//!
//! ```text
//! Panel #0 size=200x100 [layer relayout-root]
//!   Panel #1 at (10, 10) size=200x100
//! ```

use std::fmt::Write;

use lamina_core::layer::{LayerId, LayerKind, LayerTree};
use lamina_core::render::{Geometry, NodeId, RenderTree};

/// Dumps the render tree from its root, or an empty string if no root is
/// set.
#[must_use]
pub fn dump_render_tree(tree: &RenderTree) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        write_node(&mut out, tree, root, 0);
    }
    out
}

/// Dumps the render subtree rooted at `node`.
#[must_use]
pub fn dump_render_subtree(tree: &RenderTree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(&mut out, tree, node, 0);
    out
}

fn write_node(out: &mut String, tree: &RenderTree, id: NodeId, indent: usize) {
    let _ = write!(out, "{:indent$}{} #{}", "", tree.name(id), id.index(), indent = indent * 2);

    if tree.parent(id).is_some()
        && let Some(offset) = tree.parent_data(id).offset()
    {
        let _ = write!(out, " at ({}, {})", offset.x, offset.y);
    }
    match tree.geometry(id) {
        Some(Geometry::Box(size)) => {
            let _ = write!(out, " size={}x{}", size.width, size.height);
        }
        Some(Geometry::Sector {
            delta_radius,
            delta_theta,
        }) => {
            let _ = write!(out, " sector={delta_radius}x{delta_theta:.3}rad");
        }
        None => out.push_str(" size=?"),
    }

    let mut flags = Vec::new();
    if tree.needs_layout(id) {
        flags.push("needs-layout");
    }
    if tree.needs_paint(id) {
        flags.push("needs-paint");
    }
    if tree.has_own_layer(id) {
        flags.push("layer");
    } else if tree.needs_compositing(id) {
        flags.push("composited");
    }
    if tree.relayout_root(id) == Some(id) {
        flags.push("relayout-root");
    }
    if tree.is_errored(id) {
        flags.push("ERROR");
    }
    if !flags.is_empty() {
        let _ = write!(out, " [{}]", flags.join(" "));
    }
    out.push('\n');

    for child in tree.children(id) {
        write_node(out, tree, child, indent + 1);
    }
}

/// Dumps the layer subtree rooted at `root`.
#[must_use]
pub fn dump_layer_tree(layers: &LayerTree, root: LayerId) -> String {
    let mut out = String::new();
    write_layer(&mut out, layers, root, 0);
    out
}

fn write_layer(out: &mut String, layers: &LayerTree, id: LayerId, indent: usize) {
    let kind = layers.kind(id);
    let _ = write!(out, "{:indent$}{} #{}", "", kind.name(), id.index(), indent = indent * 2);

    let offset = layers.offset(id);
    if offset.x != 0.0 || offset.y != 0.0 {
        let _ = write!(out, " at ({}, {})", offset.x, offset.y);
    }
    match kind {
        LayerKind::Picture(picture) => {
            let _ = write!(
                out,
                " {:?} commands={}",
                picture.id(),
                picture.commands().len()
            );
        }
        LayerKind::Opacity(alpha) => {
            let _ = write!(out, " alpha={alpha}");
        }
        LayerKind::Transform(transform) => {
            let _ = write!(out, " {:?}", transform.as_coeffs());
        }
        LayerKind::Clip(shape) => {
            let b = shape.bounds();
            let _ = write!(out, " clip=({}, {})-({}, {})", b.x0, b.y0, b.x1, b.y1);
        }
        LayerKind::ColorFilter(filter) => {
            let _ = write!(out, " {:?} {:?}", filter.color, filter.mode);
        }
        LayerKind::Container => {}
    }
    if layers.is_retained(id) {
        out.push_str(" [retained]");
    }
    out.push('\n');

    for child in layers.children(id) {
        write_layer(out, layers, child, indent + 1);
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;
    use lamina_core::layer::ClipShape;
    use lamina_core::trace::Tracer;

    use super::*;
    use crate::testing::{frame, panel_tree};

    #[test]
    fn render_tree_dump_after_a_frame() {
        let mut tree = panel_tree();
        frame(&mut tree, 0, &mut Tracer::none());

        let dump = dump_render_tree(&tree);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2, "got:\n{dump}");
        assert!(lines[0].starts_with("Panel #0 size=200x100 ["), "got:\n{dump}");
        assert!(lines[0].contains("layer"), "got:\n{dump}");
        assert!(!lines[0].contains("needs-"), "clean after the frame");
        assert!(
            lines[1].starts_with("  Panel #1 at (10, 10) size=200x100"),
            "got:\n{dump}"
        );
    }

    #[test]
    fn dirty_nodes_are_flagged() {
        let mut tree = panel_tree();
        let dump = dump_render_tree(&tree);
        assert!(dump.lines().next().unwrap().contains("size=?"), "got:\n{dump}");

        frame(&mut tree, 0, &mut Tracer::none());
        let root = tree.root().unwrap();
        tree.mark_needs_paint(root);
        let dump = dump_render_tree(&tree);
        assert!(dump.lines().next().unwrap().contains("needs-paint"), "got:\n{dump}");
    }

    #[test]
    fn empty_tree_dumps_nothing() {
        assert_eq!(dump_render_tree(&RenderTree::new()), "");
    }

    #[test]
    fn layer_tree_dump_after_a_frame() {
        let mut tree = panel_tree();
        frame(&mut tree, 0, &mut Tracer::none());

        let root = tree.root_layer().unwrap();
        let dump = dump_layer_tree(tree.layers(), root);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2, "got:\n{dump}");
        assert!(lines[0].starts_with("container #"), "got:\n{dump}");
        assert!(lines[0].ends_with("[retained]"), "got:\n{dump}");
        assert!(lines[1].starts_with("  picture #"), "got:\n{dump}");
        assert!(lines[1].ends_with("commands=2"), "one rect per panel; got:\n{dump}");
    }

    #[test]
    fn layer_payloads_are_described() {
        let mut layers = LayerTree::new();
        let root = layers.create_layer(LayerKind::Opacity(64));
        let clip = layers.create_layer(LayerKind::Clip(ClipShape::Rect(Rect::new(
            0.0, 0.0, 5.0, 6.0,
        ))));
        layers.set_offset(clip, kurbo::Vec2::new(1.0, 2.0));
        layers.append(root, clip);

        let dump = dump_layer_tree(&layers, root);
        assert_eq!(
            dump,
            format!(
                "opacity #{} alpha=64\n  clip #{} at (1, 2) clip=(0, 0)-(5, 6)\n",
                root.index(),
                clip.index()
            )
        );
    }
}
