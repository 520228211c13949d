//! Box and label-strip rendering on raw RGB frames.
//!
//! The display copy gets a border per track plus a filled strip above
//! the box marking identity state: green for confirmed subjects, red
//! for unknowns.

use crate::recognition::domain::identity::TrackIdentity;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;
use crate::tracking::track::Track;

pub const CONFIRMED_COLOR: [u8; 3] = [0, 200, 0];
pub const UNKNOWN_COLOR: [u8; 3] = [220, 0, 0];

const BORDER_THICKNESS: i32 = 2;
const LABEL_STRIP_HEIGHT: i32 = 6;

pub fn color_for(identity: &TrackIdentity) -> [u8; 3] {
    if identity.is_confirmed() {
        CONFIRMED_COLOR
    } else {
        UNKNOWN_COLOR
    }
}

/// Draws every live track onto a display frame.
pub fn annotate_tracks(frame: &mut Frame, tracks: &[Track]) {
    for track in tracks {
        let color = color_for(&track.identity);
        draw_box(frame, &track.bbox, color);
        draw_label_strip(frame, &track.bbox, color);
    }
}

/// Hollow rectangle border.
pub fn draw_box(frame: &mut Frame, bbox: &BoundingBox, color: [u8; 3]) {
    let t = BORDER_THICKNESS;
    // Top, bottom, left, right bands.
    fill_rect(frame, &BoundingBox::new(bbox.x, bbox.y, bbox.width, t), color);
    fill_rect(
        frame,
        &BoundingBox::new(bbox.x, bbox.y + bbox.height - t, bbox.width, t),
        color,
    );
    fill_rect(frame, &BoundingBox::new(bbox.x, bbox.y, t, bbox.height), color);
    fill_rect(
        frame,
        &BoundingBox::new(bbox.x + bbox.width - t, bbox.y, t, bbox.height),
        color,
    );
}

/// Filled strip just above the box.
fn draw_label_strip(frame: &mut Frame, bbox: &BoundingBox, color: [u8; 3]) {
    let strip = BoundingBox::new(
        bbox.x,
        bbox.y - LABEL_STRIP_HEIGHT - 2,
        bbox.width,
        LABEL_STRIP_HEIGHT,
    );
    fill_rect(frame, &strip, color);
}

fn fill_rect(frame: &mut Frame, rect: &BoundingBox, color: [u8; 3]) {
    let clamped = rect.clamped(frame.width(), frame.height());
    if clamped.is_degenerate() {
        return;
    }
    let stride = frame.width() as usize * 3;
    let data = frame.data_mut();
    for row in clamped.y..clamped.y + clamped.height {
        for col in clamped.x..clamped.x + clamped.width {
            let offset = row as usize * stride + col as usize * 3;
            data[offset..offset + 3].copy_from_slice(&color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * frame.width() as usize + x) * 3;
        let d = frame.data();
        [d[offset], d[offset + 1], d[offset + 2]]
    }

    fn blank(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 0)
    }

    #[test]
    fn test_draw_box_colors_border_not_interior() {
        let mut frame = blank(40, 40);
        draw_box(&mut frame, &BoundingBox::new(10, 10, 20, 20), CONFIRMED_COLOR);

        assert_eq!(pixel(&frame, 10, 10), CONFIRMED_COLOR); // corner
        assert_eq!(pixel(&frame, 29, 29), CONFIRMED_COLOR); // far corner
        assert_eq!(pixel(&frame, 20, 20), [0, 0, 0]); // interior untouched
        assert_eq!(pixel(&frame, 5, 5), [0, 0, 0]); // outside untouched
    }

    #[test]
    fn test_draw_box_clamps_at_frame_edges() {
        let mut frame = blank(20, 20);
        // Box hangs off the top-left; must not panic.
        draw_box(&mut frame, &BoundingBox::new(-5, -5, 15, 15), UNKNOWN_COLOR);
        assert_eq!(pixel(&frame, 0, 9), UNKNOWN_COLOR);
    }

    #[test]
    fn test_label_strip_sits_above_box() {
        let mut frame = blank(40, 40);
        draw_label_strip(&mut frame, &BoundingBox::new(10, 20, 20, 10), UNKNOWN_COLOR);

        assert_eq!(pixel(&frame, 15, 13), UNKNOWN_COLOR);
        // Row directly above the box is the gap, untouched.
        assert_eq!(pixel(&frame, 15, 19), [0, 0, 0]);
    }

    #[test]
    fn test_color_for_identity_states() {
        let confirmed = TrackIdentity::Confirmed {
            person_key: 1,
            display_code: "EMP001".into(),
            score: 0.8,
        };
        assert_eq!(color_for(&confirmed), CONFIRMED_COLOR);
        assert_eq!(
            color_for(&TrackIdentity::Unknown { ephemeral: 0 }),
            UNKNOWN_COLOR
        );
    }
}
