#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use snapsheet::{
    Classification, DragSample, Point, ScrollableHandle, SheetConfig, SheetController,
    SheetPhase, SnapPoint, StaticLayout, Vec2, VirtualScrollable, classify,
};

#[derive(Debug, Arbitrary)]
enum Input {
    Begin { on_scrollable: bool, scrolled: i16 },
    Move(i16),
    Release { vx: i16, vy: i16 },
    Cancel,
    Tick(u8),
    MoveTo { index: u8, animated: bool },
    Relayout { height: u16, margin: u8, content: Option<u16> },
    Scrolled(i8),
}

#[derive(Debug, Arbitrary)]
struct Session {
    height: u16,
    fractions: Vec<u8>,
    auto_fit: bool,
    inputs: Vec<Input>,
}

const FRAME: Duration = Duration::from_millis(16);

fn snap_points(session: &Session) -> Vec<SnapPoint> {
    let mut points: Vec<SnapPoint> = session
        .fractions
        .iter()
        .take(8)
        .map(|&f| SnapPoint::Fraction(f64::from(f) / 255.0))
        .collect();
    if session.auto_fit {
        points.push(SnapPoint::AutoFit);
    }
    points.push(SnapPoint::FULL);
    points
}

fuzz_target!(|session: Session| {
    let points = snap_points(&session);
    let config = SheetConfig::with_snap_points(points.iter().copied());
    let mut sheet = SheetController::new(config).expect("generated points are valid");
    let height = f64::from(session.height.max(1));
    sheet
        .update_layout(&StaticLayout::new(390.0, height).with_content_height(height / 2.0))
        .expect("layout");

    let mut scrollable: Option<std::rc::Rc<std::cell::RefCell<VirtualScrollable>>> = None;

    for input in session.inputs.iter().take(256) {
        match *input {
            Input::Begin { on_scrollable, scrolled } => {
                scrollable = on_scrollable.then(|| {
                    VirtualScrollable::new()
                        .scrolled_to(f64::from(scrolled))
                        .into_handle()
                });
                let handle = scrollable.clone().map(|h| h as ScrollableHandle);
                sheet.handle_gesture(&DragSample::began(Point::ZERO), handle);
            }
            Input::Move(dy) => {
                sheet.handle_gesture(&DragSample::changed(f64::from(dy), 0.0), None);
            }
            Input::Release { vx, vy } => {
                let velocity = Vec2::new(f64::from(vx) * 4.0, f64::from(vy) * 4.0);
                sheet.handle_gesture(&DragSample::ended(velocity), None);
            }
            Input::Cancel => {
                sheet.handle_gesture(&DragSample::cancelled(), None);
            }
            Input::Tick(frames) => {
                for _ in 0..frames {
                    sheet.tick(FRAME);
                }
            }
            Input::MoveTo { index, animated } => {
                // Deduplicated points may not resolve; errors are fine.
                let point = points[usize::from(index) % points.len()];
                let _ = sheet.move_to(point, animated);
            }
            Input::Relayout { height, margin, content } => {
                let mut layout = StaticLayout::new(390.0, f64::from(height))
                    .with_top_margin(f64::from(margin));
                if let Some(content) = content {
                    layout = layout.with_content_height(f64::from(content));
                }
                sheet.update_layout(&layout).expect("layout");
            }
            Input::Scrolled(dy) => {
                if let Some(handle) = scrollable.as_ref() {
                    handle.borrow_mut().scroll_by(f64::from(dy));
                    sheet.on_scrollable_scrolled();
                }
            }
        }

        assert!(sheet.offset().is_finite(), "offset not finite: {sheet:?}");
        assert!(sheet.height_adjustment().is_finite(), "adjustment not finite");
        if let Some(state) = sheet.resolved()
            && let Classification::Between(range) = classify(sheet.offset(), state.points())
        {
            assert!(
                range.start.offset < sheet.offset() && sheet.offset() < range.end.offset,
                "Between does not bracket the offset"
            );
        }
    }

    // Lift any finger and let everything finish.
    if sheet.phase() == SheetPhase::Tracking {
        sheet.handle_gesture(&DragSample::ended(Vec2::ZERO), None);
    }
    for _ in 0..10_000 {
        if !sheet.tick(FRAME) {
            break;
        }
    }
    assert_eq!(sheet.phase(), SheetPhase::Idle, "never came to rest");
    let current = sheet.current_snap_point().expect("laid out");
    assert_eq!(sheet.offset(), current.offset, "rest is not on the current point");
});
