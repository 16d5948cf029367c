//! Property-based tests for springs and scrubbable animations.
//!
//! Invariants tested:
//!
//! 1. A spring with a positive response always comes to rest exactly on its
//!    target, whatever its start, target, and seed velocity.
//! 2. Position stays finite on every frame.
//! 3. `set_fraction_complete` clamps into `[0, 1]` and pauses the animation.
//! 4. A resumed scrub finishes at the end it runs toward.

use proptest::prelude::*;
use snapsheet_core::animation::*;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

// ── Strategies ──────────────────────────────────────────────────────────

fn profile() -> impl Strategy<Value = SpringProfile> {
    (0.3..1.2f64, 0.1..0.9f64).prop_map(|(damping, response)| SpringProfile::new(damping, response))
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Springs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn spring_rests_exactly_on_target(
        start in -2_000.0..2_000.0f64,
        target in -2_000.0..2_000.0f64,
        velocity in -20.0..20.0f64,
        profile in profile(),
    ) {
        // Seeds are unit-relative, as the sheet hands them out.
        let seed = velocity * (target - start).abs();
        let mut spring = Spring::new(start, target)
            .with_profile(profile)
            .with_velocity(seed);
        let mut rested = false;
        for _ in 0..5_000 {
            spring.advance(FRAME);
            prop_assert!(spring.position().is_finite());
            if spring.is_at_rest() {
                rested = true;
                break;
            }
        }
        prop_assert!(rested, "spring never rested: {:?}", spring);
        prop_assert_eq!(spring.position(), target);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4. Scrubbing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn scrub_fraction_is_clamped_and_paused(fraction in -5.0..5.0f64) {
        let mut scrub = ScrubAnimation::new(Duration::from_millis(250));
        scrub.set_fraction_complete(fraction);
        prop_assert!((0.0..=1.0).contains(&scrub.fraction_complete()));
        prop_assert_eq!(scrub.state(), PlaybackState::Paused);
    }

    #[test]
    fn resumed_scrub_finishes_at_its_end(
        fraction in 0.0..=1.0f64,
        reversed in any::<bool>(),
    ) {
        let mut scrub = ScrubAnimation::new(Duration::from_millis(250));
        scrub.set_fraction_complete(fraction);
        scrub.resume(reversed);
        for _ in 0..100 {
            if scrub.is_complete() {
                break;
            }
            scrub.tick(FRAME);
        }
        prop_assert!(scrub.is_complete());
        let end = if reversed { 0.0 } else { 1.0 };
        prop_assert_eq!(scrub.fraction_complete(), end);
    }
}
