/// What "use key on door" does when the key fits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UseKeyRule {
    /// Unlocks only; opening is a separate action.
    #[default]
    UnlockOnly,
    /// Unlocks and opens in one step.
    UnlockAndOpen,
}

pub const DEFAULT_TABLE_SHIFT_PX: f32 = 48.0;

/// Read-only rule settings handed to the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub use_key_rule: UseKeyRule,
    /// Horizontal distance a table travels when pushed (+x) or pulled (-x).
    pub table_shift_px: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            use_key_rule: UseKeyRule::default(),
            table_shift_px: DEFAULT_TABLE_SHIFT_PX,
        }
    }
}
