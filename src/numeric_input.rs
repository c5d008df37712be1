use placer_geometry::WORLD_SANITY_LIMIT;
use serde::{Deserialize, Serialize};

/// Seconds a typed value stays open without further keystrokes.
pub const DEFAULT_GRACE_PERIOD: f64 = 3.0;

/// What a typed number will drive once confirmed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NumericAction {
    /// Degrees about world X.
    RotateX,
    /// Degrees about world Y.
    RotateY,
    /// Degrees about world Z.
    RotateZ,
    /// Uniform scale factor.
    Scale,
    /// World Y position.
    Height,
    PositionForward,
    PositionBack,
    PositionLeft,
    PositionRight,
}

impl NumericAction {
    pub const fn label(self) -> &'static str {
        match self {
            NumericAction::RotateX => "rotate_x",
            NumericAction::RotateY => "rotate_y",
            NumericAction::RotateZ => "rotate_z",
            NumericAction::Scale => "scale",
            NumericAction::Height => "height",
            NumericAction::PositionForward => "position_forward",
            NumericAction::PositionBack => "position_back",
            NumericAction::PositionLeft => "position_left",
            NumericAction::PositionRight => "position_right",
        }
    }

    /// Directional moves treat the value as a distance, not a target.
    pub const fn is_directional(self) -> bool {
        matches!(
            self,
            NumericAction::PositionForward
                | NumericAction::PositionBack
                | NumericAction::PositionLeft
                | NumericAction::PositionRight
        )
    }
}

/// How a typed value combines with the current one.
///
/// Without a prefix key the value is absolute.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum PrefixMode {
    /// `=`: replace the current value.
    #[default]
    Absolute,
    /// `+`: add to the current value.
    RelativeAdd,
    /// `-`: subtract from the current value.
    RelativeSub,
}

impl PrefixMode {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '=' => Some(PrefixMode::Absolute),
            '+' => Some(PrefixMode::RelativeAdd),
            '-' => Some(PrefixMode::RelativeSub),
            _ => None,
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            PrefixMode::Absolute => '=',
            PrefixMode::RelativeAdd => '+',
            PrefixMode::RelativeSub => '-',
        }
    }
}

/// Collects typed digits for one action.
///
/// The digit buffer only ever holds an unsigned decimal; the sign comes from
/// [`PrefixMode`]. Tapping an action key arms a context, and the session only
/// becomes active once a digit or prefix is actually typed.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericInputAccumulator {
    active: bool,
    action: Option<NumericAction>,
    digits: String,
    prefix_mode: PrefixMode,
    explicit_prefix: bool,
    last_input_time: f64,
    confirmed: bool,
    grace_period: f64,
}

impl Default for NumericInputAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl NumericInputAccumulator {
    pub fn new(grace_period: f64) -> Self {
        Self {
            active: false,
            action: None,
            digits: String::new(),
            prefix_mode: PrefixMode::Absolute,
            explicit_prefix: false,
            last_input_time: 0.0,
            confirmed: false,
            grace_period,
        }
    }

    /// Arm `action` for typed input. Clears any previous buffer.
    pub fn set_action_context(&mut self, action: NumericAction, now: f64) {
        let grace_period = self.grace_period;
        *self = Self::new(grace_period);
        self.action = Some(action);
        self.last_input_time = now;
    }

    /// Append a digit or the decimal point. Returns whether the key was consumed.
    pub fn push_digit(&mut self, key: char, now: f64) -> bool {
        if self.action.is_none() || self.confirmed {
            return false;
        }
        let accepted = match key {
            '0'..='9' => true,
            '.' => !self.digits.contains('.'),
            _ => false,
        };
        if !accepted {
            return false;
        }
        self.digits.push(key);
        self.active = true;
        self.last_input_time = now;
        true
    }

    /// Set the prefix mode. Only accepted before the first digit.
    pub fn push_prefix(&mut self, key: char, now: f64) -> bool {
        if self.action.is_none() || self.confirmed || !self.digits.is_empty() {
            return false;
        }
        let Some(mode) = PrefixMode::from_key(key) else {
            return false;
        };
        self.prefix_mode = mode;
        self.explicit_prefix = true;
        self.active = true;
        self.last_input_time = now;
        true
    }

    /// Drop the last typed character, then the prefix.
    pub fn backspace(&mut self, now: f64) -> bool {
        if !self.active || self.confirmed {
            return false;
        }
        if self.digits.pop().is_none() {
            self.prefix_mode = PrefixMode::Absolute;
            self.explicit_prefix = false;
        }
        if self.digits.is_empty() && !self.explicit_prefix {
            self.active = false;
        }
        self.last_input_time = now;
        true
    }

    pub fn is_within_grace_period(&self, now: f64) -> bool {
        self.action.is_some() && now - self.last_input_time < self.grace_period
    }

    /// Reset if the grace period ran out before confirmation.
    ///
    /// The context is not re-armed; the user has to tap the action key again.
    pub fn expire_if_stale(&mut self, now: f64) -> bool {
        if self.action.is_some() && !self.confirmed && !self.is_within_grace_period(now) {
            self.reset();
            return true;
        }
        false
    }

    /// Mark the typed value as ready. Returns `false` when nothing was typed.
    pub fn confirm_action(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.confirmed = true;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Typed but not yet confirmed: the router suppresses other input.
    pub fn is_pending(&self) -> bool {
        self.active && !self.confirmed
    }

    pub fn has_context(&self) -> bool {
        self.action.is_some()
    }

    pub fn active_action(&self) -> Option<NumericAction> {
        self.action
    }

    pub fn prefix_mode(&self) -> PrefixMode {
        self.prefix_mode
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Parsed buffer, or `None` when it holds no number yet or overflows.
    ///
    /// Finite values are capped at [`WORLD_SANITY_LIMIT`].
    pub fn numeric_value(&self) -> Option<f32> {
        if self.digits.is_empty() || self.digits == "." {
            return None;
        }
        self.digits
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.min(WORLD_SANITY_LIMIT))
    }

    /// Combine the typed value with `current`. An empty buffer leaves it alone.
    pub fn apply_to_value(&self, current: f32) -> f32 {
        let Some(value) = self.numeric_value() else {
            return current;
        };
        match self.prefix_mode {
            PrefixMode::Absolute => value,
            PrefixMode::RelativeAdd => current + value,
            PrefixMode::RelativeSub => current - value,
        }
    }

    /// Text for the overlay, e.g. `rotate_y +12.5`.
    pub fn display_text(&self) -> Option<String> {
        let action = self.action?;
        if !self.active {
            return None;
        }
        let prefix = if self.explicit_prefix {
            self.prefix_mode.symbol().to_string()
        } else {
            String::new()
        };
        Some(format!("{} {}{}", action.label(), prefix, self.digits))
    }

    pub fn reset(&mut self) {
        let grace_period = self.grace_period;
        *self = Self::new(grace_period);
    }
}
