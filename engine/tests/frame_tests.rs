use engine::graphics::{Renderer2d, fit_text, line_advance_y, text_width};
use engine::surface::{FrameBuffer, SurfaceSize};
use engine::ui::{Anchor, Rect, Size};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[test]
fn clear_then_outline_leaves_interior_untouched() {
    let mut frame = FrameBuffer::new(SurfaceSize::new(20, 20));
    {
        let mut gfx = frame.renderer();
        gfx.clear(BLUE);
        gfx.rect_outline(Rect::new(2, 2, 10, 10), RED);
    }
    assert_eq!(frame.pixel(2, 2), Some(RED));
    assert_eq!(frame.pixel(11, 11), Some(RED));
    assert_eq!(frame.pixel(6, 6), Some(BLUE));
    assert_eq!(frame.pixel(12, 12), Some(BLUE));
}

#[test]
fn drawing_past_the_edge_is_clipped() {
    let mut frame = FrameBuffer::new(SurfaceSize::new(8, 8));
    {
        let mut gfx = frame.renderer();
        gfx.fill_rect(Rect::new(6, 6, 100, 100), RED);
        gfx.draw_text_scaled(7, 0, "WIDE TEXT", WHITE, 3);
        gfx.blit_rgba(7, 7, 2, 2, &[9; 16]);
    }
    assert_eq!(frame.pixel(7, 7), Some([9, 9, 9, 255]));
    assert_eq!(frame.pixel(8, 8), None);
    assert_eq!(frame.pixels().len(), 8 * 8 * 4);
}

#[test]
fn centred_label_fits_inside_button() {
    let button = Rect::new(10, 10, 96, 32);
    let label = fit_text("A VERY LONG BUTTON LABEL", button.w, 2);
    let area = button.place(
        Size::new(text_width(&label, 2), line_advance_y(2)),
        Anchor::Center,
    );
    assert!(area.x >= button.x && area.right() <= button.right());
    assert!(label.ends_with(".."));

    let mut frame = FrameBuffer::new(SurfaceSize::new(120, 60));
    {
        let mut gfx = frame.renderer();
        gfx.draw_text(area.x, area.y, &label, WHITE);
    }
    let lit = (0..frame.size().height)
        .flat_map(|y| (0..frame.size().width).map(move |x| (x, y)))
        .filter(|&(x, y)| frame.pixel(x, y) == Some(WHITE))
        .collect::<Vec<_>>();
    assert!(!lit.is_empty());
    assert!(lit.iter().all(|&(x, y)| button.contains(x, y)));
}
