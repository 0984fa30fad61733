//! Player animation codes.
//!
//! Animations travel as an `i16` index into [`ANIM_NAMES`]; `-1` is unknown.
//! Receivers resolve the code back to the action name the animator plays.

/// Action names, indexed by wire code.
pub const ANIM_NAMES: &[&str] = &[
    "Wait",
    "WaitSleep",
    "WaitHot",
    "WaitCold",
    "Walk",
    "Run",
    "RunStart",
    "Brake",
    "Turn",
    "Squat",
    "SquatWait",
    "SquatWalk",
    "Rolling",
    "RollingStart",
    "Jump",
    "Jump2",
    "Jump3",
    "JumpBack",
    "JumpTurn",
    "JumpBroad",
    "JumpCapCatch",
    "SpinJump",
    "Fall",
    "Land",
    "LandStiffen",
    "HipDropStart",
    "HipDrop",
    "HipDropLand",
    "WallCatch",
    "WallSlide",
    "WallJump",
    "GrabCeil",
    "PoleClimb",
    "PoleCatch",
    "HangWait",
    "HangMove",
    "ClimbUp",
    "SwimWait",
    "Swim",
    "SwimDive",
    "SwimSurface",
    "Dive",
    "DiveLand",
    "CapThrow",
    "CapThrowRotate",
    "CapThrowSpin",
    "CapCatch",
    "Damage",
    "DamageFire",
    "DamageElectric",
    "Dead",
    "DeadFall",
    "Ride",
    "Sand",
    "Slip",
    "Kick",
    "Punch",
    "Trample",
    "DemoWait",
    "TalkWait",
];

/// A resolved animation code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlayerAnim(i16);

impl PlayerAnim {
    /// The unknown animation.
    pub const UNKNOWN: Self = Self(-1);

    /// Fallback action name for an unknown main animation.
    pub const DEFAULT_ACT: &'static str = "Wait";

    /// Looks up an action name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        ANIM_NAMES
            .iter()
            .position(|&n| n == name)
            .and_then(|i| i16::try_from(i).ok())
            .map_or(Self::UNKNOWN, Self)
    }

    /// Wraps a wire code without validation.
    #[must_use]
    pub const fn from_code(code: i16) -> Self {
        Self(code)
    }

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> i16 {
        self.0
    }

    /// Action name, or `None` when the code is out of range.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        usize::try_from(self.0).ok().and_then(|i| ANIM_NAMES.get(i).copied())
    }
}

impl Default for PlayerAnim {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anim_roundtrip_by_name() {
        let anim = PlayerAnim::from_name("HipDrop");
        assert_eq!(anim.name(), Some("HipDrop"));
        assert_eq!(PlayerAnim::from_name("Moonwalk"), PlayerAnim::UNKNOWN);
    }

    #[test]
    fn test_anim_out_of_range() {
        assert_eq!(PlayerAnim::UNKNOWN.name(), None);
        assert_eq!(PlayerAnim::from_code(i16::MAX).name(), None);
        assert_eq!(PlayerAnim::from_code(0).name(), Some("Wait"));
    }
}
