//! # Command saturation
//!
//! Clamps each stick channel into the symmetric control envelope `[-limit, limit]`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::StickCmd;
use util::maths::clamp_sym;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Saturate each channel of the command independently.
pub fn saturate(cmd: &StickCmd, limit: f64) -> StickCmd {
    cmd.map(|c| clamp_sym(c, limit))
}

/// True if any channel of the raw command lies outside the envelope.
pub fn is_saturated(raw: &StickCmd, limit: f64) -> bool {
    raw.channels().iter().any(|c| c.abs() > limit.abs())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_saturate_within_limit_unchanged() {
        let cmd = StickCmd::new(0.15, -0.3, 0.0, 0.299);

        assert_eq!(saturate(&cmd, 0.3), cmd);
        assert!(!is_saturated(&cmd, 0.3));
    }

    #[test]
    fn test_saturate_clamps_each_channel() {
        let cmd = StickCmd::new(1.8, -0.31, 0.2, -250.0);

        assert_eq!(saturate(&cmd, 0.3), StickCmd::new(0.3, -0.3, 0.2, -0.3));
        assert!(is_saturated(&cmd, 0.3));
    }

    #[test]
    fn test_saturate_idempotent_and_bounded() {
        let limit = 0.3;
        let mut v = -3.0;

        while v <= 3.0 {
            let cmd = StickCmd::new(v, -v, v * 0.1, v * 0.01);
            let once = saturate(&cmd, limit);

            assert_eq!(saturate(&once, limit), once);
            assert!(once.channels().iter().all(|c| c.abs() <= limit));

            v += 0.037;
        }
    }
}
