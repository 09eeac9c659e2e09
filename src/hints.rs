//! Rest-break hints shown while the countdown runs

use rand::seq::SliceRandom;

pub const REST_HINTS: &[&str] = &[
    "Breathe through your nose and let your heart rate settle before the next set.",
    "Shake out the working muscles; don't sit down for short rests.",
    "Sip water between sets, not just at the end of the workout.",
    "Rushing rest costs reps. Let the timer run out on heavy sets.",
    "Think through the next set: grip, stance, bracing, then lift.",
    "If the last set felt easy, add a little weight; if form broke down, don't.",
    "Longer rest for strength work, shorter rest for conditioning.",
    "Keep warm between sets; a cold muscle lifts worse.",
    "Log how the set felt while it's fresh. Notes beat memory.",
    "Full range beats extra load. Rest, then do the rep properly.",
];

/// A random hint for the rest screen
pub fn random() -> &'static str {
    REST_HINTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(REST_HINTS[0])
}
