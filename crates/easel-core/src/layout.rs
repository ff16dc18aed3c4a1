//! Artboard child layout.
//!
//! Children of an artboard ignore their own `position` and are placed by
//! the artboard's flex or grid rules inside its padded content box. Each
//! child keeps its own size, except where `stretch` or grid tracks dictate
//! the cross-axis or column width.

use crate::items::{
    Align, ArtboardLayout, CanvasItem, FlexDirection, ItemFrame, ItemId, ItemKind, Justify,
    LayoutDisplay,
};
use crate::store::ItemStore;
use kurbo::{Point, Rect, Size};

/// Resolved rectangles for an artboard's children, in sibling order.
pub fn resolve_children(store: &ItemStore, artboard_id: &str) -> Vec<(ItemId, Rect)> {
    let Some(artboard) = store.get(artboard_id) else {
        return Vec::new();
    };
    let ItemKind::Artboard(data) = &artboard.kind else {
        return Vec::new();
    };
    let children = store.children_of(artboard_id);
    let rects = layout_children(artboard.rect(), &data.layout, &children);
    children
        .iter()
        .map(|child| child.id.clone())
        .zip(rects)
        .collect()
}

/// Where an item actually sits: its layout slot if parented, else its own geometry.
pub fn resolve_frame(store: &ItemStore, id: &str) -> Option<ItemFrame> {
    let item = store.get(id)?;
    let Some(parent) = item.parent_id.as_deref() else {
        return Some(item.frame());
    };
    let rect = resolve_children(store, parent)
        .into_iter()
        .find(|(child, _)| child == id)
        .map(|(_, rect)| rect)
        .unwrap_or_else(|| item.rect());
    Some(ItemFrame {
        position: rect.origin(),
        size: rect.size(),
        rotation: item.rotation,
    })
}

/// Lay out `children` inside `bounds`.
pub fn layout_children(bounds: Rect, layout: &ArtboardLayout, children: &[&CanvasItem]) -> Vec<Rect> {
    if children.is_empty() {
        return Vec::new();
    }
    let content = bounds.inset(-layout.padding.max(0.0));
    let content = Rect::new(
        content.x0,
        content.y0,
        content.x1.max(content.x0),
        content.y1.max(content.y0),
    );
    match layout.display {
        LayoutDisplay::Flex => flex(content, layout, children),
        LayoutDisplay::Grid => grid(content, layout, children),
    }
}

/// Smallest artboard size that holds its children without overflow.
pub fn content_size(layout: &ArtboardLayout, children: &[&CanvasItem]) -> Size {
    let pad = layout.padding.max(0.0) * 2.0;
    if children.is_empty() {
        return Size::new(pad, pad);
    }
    let gap = layout.gap.max(0.0);
    let gaps = |n: usize| gap * n.saturating_sub(1) as f64;
    match layout.display {
        LayoutDisplay::Flex => {
            let widths = children.iter().map(|c| c.size.width);
            let heights = children.iter().map(|c| c.size.height);
            match layout.direction {
                FlexDirection::Row => Size::new(
                    widths.sum::<f64>() + gaps(children.len()) + pad,
                    heights.fold(0.0, f64::max) + pad,
                ),
                FlexDirection::Column => Size::new(
                    widths.fold(0.0, f64::max) + pad,
                    heights.sum::<f64>() + gaps(children.len()) + pad,
                ),
            }
        }
        LayoutDisplay::Grid => {
            let columns = layout.column_count();
            let track = children.iter().map(|c| c.size.width).fold(0.0, f64::max);
            let rows: Vec<f64> = children
                .chunks(columns)
                .map(|row| row.iter().map(|c| c.size.height).fold(0.0, f64::max))
                .collect();
            let used_columns = columns.min(children.len());
            Size::new(
                track * used_columns as f64 + gaps(used_columns) + pad,
                rows.iter().sum::<f64>() + gaps(rows.len()) + pad,
            )
        }
    }
}

fn flex(content: Rect, layout: &ArtboardLayout, children: &[&CanvasItem]) -> Vec<Rect> {
    let row = layout.direction == FlexDirection::Row;
    let main = |s: Size| if row { s.width } else { s.height };
    let cross = |s: Size| if row { s.height } else { s.width };

    let content_main = main(content.size());
    let content_cross = cross(content.size());
    let count = children.len();
    let gap = layout.gap.max(0.0);
    let used: f64 = children.iter().map(|c| main(c.size)).sum::<f64>() + gap * (count - 1) as f64;
    let free = content_main - used;

    let (mut cursor, spacing) = match layout.justify {
        Justify::Start => (0.0, gap),
        Justify::Center => (free / 2.0, gap),
        Justify::End => (free, gap),
        Justify::SpaceBetween if count > 1 && free > 0.0 => (0.0, gap + free / (count - 1) as f64),
        Justify::SpaceBetween => (0.0, gap),
    };

    let mut rects = Vec::with_capacity(count);
    for child in children {
        let child_main = main(child.size);
        let (child_cross, cross_offset) = match layout.align {
            Align::Start => (cross(child.size), 0.0),
            Align::Center => (cross(child.size), (content_cross - cross(child.size)) / 2.0),
            Align::End => (cross(child.size), content_cross - cross(child.size)),
            Align::Stretch => (content_cross.max(cross(child.min_size())), 0.0),
        };
        let rect = if row {
            Rect::from_origin_size(
                Point::new(content.x0 + cursor, content.y0 + cross_offset),
                Size::new(child_main, child_cross),
            )
        } else {
            Rect::from_origin_size(
                Point::new(content.x0 + cross_offset, content.y0 + cursor),
                Size::new(child_cross, child_main),
            )
        };
        rects.push(rect);
        cursor += child_main + spacing;
    }
    rects
}

fn grid(content: Rect, layout: &ArtboardLayout, children: &[&CanvasItem]) -> Vec<Rect> {
    let columns = layout.column_count();
    let gap = layout.gap.max(0.0);
    let track = ((content.width() - gap * (columns - 1) as f64) / columns as f64).max(0.0);

    let mut rects = Vec::with_capacity(children.len());
    let mut y = content.y0;
    for row in children.chunks(columns) {
        let row_height = row.iter().map(|c| c.size.height).fold(0.0, f64::max);
        for (col, child) in row.iter().enumerate() {
            let x = content.x0 + col as f64 * (track + gap);
            rects.push(Rect::from_origin_size(
                Point::new(x, y),
                Size::new(track, child.size.height),
            ));
        }
        y += row_height + gap;
    }
    rects
}
