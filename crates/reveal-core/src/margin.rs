#![forbid(unsafe_code)]

//! CSS-like root margin.
//!
//! A root margin grows (positive lengths) or shrinks (negative lengths) the
//! viewport rectangle before intersections are measured. The textual form
//! follows the CSS `margin` shorthand, restricted to `px` and `%` units:
//!
//! | Values | Meaning                         |
//! |--------|---------------------------------|
//! | 1      | all four sides                  |
//! | 2      | vertical, horizontal            |
//! | 3      | top, horizontal, bottom         |
//! | 4      | top, right, bottom, left        |
//!
//! A bare `0` is accepted without a unit.

use std::fmt;
use std::str::FromStr;

use crate::geometry::Rect;

/// Unit of a single margin component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginUnit {
    #[default]
    Px,
    /// Percentage of the root's width (left/right) or height (top/bottom).
    Percent,
}

/// One side of a [`RootMargin`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarginLength {
    pub value: f64,
    pub unit: MarginUnit,
}

impl MarginLength {
    #[must_use]
    pub const fn px(value: f64) -> Self {
        Self {
            value,
            unit: MarginUnit::Px,
        }
    }

    #[must_use]
    pub const fn percent(value: f64) -> Self {
        Self {
            value,
            unit: MarginUnit::Percent,
        }
    }

    /// Resolve to pixels. `basis` is the root extent along the same axis.
    #[must_use]
    pub fn resolve(self, basis: f64) -> f64 {
        match self.unit {
            MarginUnit::Px => self.value,
            MarginUnit::Percent => basis * self.value / 100.0,
        }
    }

    fn parse_token(token: &str) -> Result<Self, MarginParseError> {
        let invalid = || MarginParseError::InvalidLength(token.to_owned());
        // Units are case-insensitive, as in CSS.
        let lowered = token.to_ascii_lowercase();
        let (number, unit) = if let Some(n) = lowered.strip_suffix("px") {
            (n, MarginUnit::Px)
        } else if let Some(n) = lowered.strip_suffix('%') {
            (n, MarginUnit::Percent)
        } else {
            (lowered.as_str(), MarginUnit::Px)
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        // Unitless lengths are only valid for zero.
        if number.len() == lowered.len() && value != 0.0 {
            return Err(invalid());
        }
        Ok(Self { value, unit })
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            MarginUnit::Px => write!(f, "{}px", self.value),
            MarginUnit::Percent => write!(f, "{}%", self.value),
        }
    }
}

/// Errors from [`RootMargin::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarginParseError {
    /// Input was empty or whitespace only.
    Empty,
    /// More than four components were supplied.
    TooManyValues(usize),
    /// A component was not a `px`/`%` length.
    InvalidLength(String),
}

impl fmt::Display for MarginParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "root margin is empty"),
            Self::TooManyValues(n) => write!(f, "root margin takes 1-4 values, got {n}"),
            Self::InvalidLength(token) => {
                write!(f, "invalid root margin length {token:?} (expected px or %)")
            }
        }
    }
}

impl std::error::Error for MarginParseError {}

/// Expansion or contraction applied to the viewport before measuring.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    /// Same length on every side.
    #[must_use]
    pub const fn uniform(length: MarginLength) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Parse the CSS shorthand form.
    pub fn parse(input: &str) -> Result<Self, MarginParseError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let lengths = tokens
            .iter()
            .map(|t| MarginLength::parse_token(t))
            .collect::<Result<Vec<_>, _>>()?;
        match lengths.as_slice() {
            [] => Err(MarginParseError::Empty),
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            more => Err(MarginParseError::TooManyValues(more.len())),
        }
    }

    /// Grow (or shrink, for negative lengths) `root` by this margin.
    ///
    /// A contraction past zero yields an empty rectangle rather than a
    /// negative extent.
    #[must_use]
    pub fn apply(&self, root: Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            (root.width + left + right).max(0.0),
            (root.height + top + bottom).max(0.0),
        )
    }
}

impl FromStr for RootMargin {
    type Err = MarginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zero_px() {
        let margin = RootMargin::default();
        assert_eq!(margin, RootMargin::parse("0px").unwrap());
        assert_eq!(margin.to_string(), "0px 0px 0px 0px");
    }

    #[test]
    fn bare_zero_is_accepted() {
        assert_eq!(RootMargin::parse("0").unwrap(), RootMargin::default());
    }

    #[test]
    fn unitless_non_zero_is_rejected() {
        assert_eq!(
            RootMargin::parse("10"),
            Err(MarginParseError::InvalidLength("10".into()))
        );
    }

    #[test]
    fn shorthand_expansion() {
        let two = RootMargin::parse("10px 5%").unwrap();
        assert_eq!(two.top, MarginLength::px(10.0));
        assert_eq!(two.bottom, MarginLength::px(10.0));
        assert_eq!(two.left, MarginLength::percent(5.0));
        assert_eq!(two.right, MarginLength::percent(5.0));

        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(three.top, MarginLength::px(1.0));
        assert_eq!(three.right, MarginLength::px(2.0));
        assert_eq!(three.bottom, MarginLength::px(3.0));
        assert_eq!(three.left, MarginLength::px(2.0));

        let four = RootMargin::parse("  1px -2px 3% 4px ").unwrap();
        assert_eq!(four.right, MarginLength::px(-2.0));
        assert_eq!(four.bottom, MarginLength::percent(3.0));
        assert_eq!(four.left, MarginLength::px(4.0));
    }

    #[test]
    fn units_are_case_insensitive() {
        assert_eq!(
            RootMargin::parse("10PX -5Px").unwrap(),
            RootMargin::parse("10px -5px").unwrap()
        );
        assert!(matches!(
            RootMargin::parse("10EM"),
            Err(MarginParseError::InvalidLength(ref t)) if t == "10EM"
        ));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(RootMargin::parse("   "), Err(MarginParseError::Empty));
        assert_eq!(
            RootMargin::parse("1px 1px 1px 1px 1px"),
            Err(MarginParseError::TooManyValues(5))
        );
        assert!(matches!(
            RootMargin::parse("10em"),
            Err(MarginParseError::InvalidLength(_))
        ));
        assert!(matches!(
            RootMargin::parse("NaNpx"),
            Err(MarginParseError::InvalidLength(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let margin = RootMargin::parse("-50px 10%").unwrap();
        let text = margin.to_string();
        assert_eq!(text, "-50px 10% -50px 10%");
        assert_eq!(RootMargin::parse(&text).unwrap(), margin);
    }

    #[test]
    fn apply_expands_and_contracts() {
        let root = Rect::new(0.0, 0.0, 200.0, 100.0);

        let grown = RootMargin::parse("10px").unwrap().apply(root);
        assert_eq!(grown, Rect::new(-10.0, -10.0, 220.0, 120.0));

        let shrunk = RootMargin::parse("-10% 0px").unwrap().apply(root);
        assert_eq!(shrunk, Rect::new(0.0, 10.0, 200.0, 80.0));

        let collapsed = RootMargin::parse("-100px").unwrap().apply(root);
        assert_eq!(collapsed.height, 0.0);
        assert_eq!(collapsed.width, 0.0);
    }
}
