//! Viewport geometry for intersection observation
//!
//! Only the vertical axis is modelled: every observer on the site cares about
//! elements scrolling into view, and horizontal margins are always `0px`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A CSS length as accepted by `rootMargin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    /// Resolve against the root dimension percentages refer to
    pub fn resolve(&self, basis: f64) -> f64 {
        match *self {
            Length::Px(px) => px,
            Length::Percent(pct) => basis * pct / 100.0,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        if let Some(num) = token.strip_suffix('%') {
            num.parse().ok().map(Length::Percent)
        } else if let Some(num) = token.strip_suffix("px") {
            num.parse().ok().map(Length::Px)
        } else if token == "0" {
            Some(Length::Px(0.0))
        } else {
            None
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(px) => write!(f, "{}px", px),
            Length::Percent(pct) => write!(f, "{}%", pct),
        }
    }
}

/// Margin grown (positive) or shrunk (negative) around the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: Length::Px(0.0),
            right: Length::Px(0.0),
            bottom: Length::Px(0.0),
            left: Length::Px(0.0),
        }
    }
}

impl RootMargin {
    /// Parse CSS margin shorthand with one to four values
    pub fn parse(input: &str) -> Result<Self> {
        let values = input
            .split_whitespace()
            .map(|token| Length::parse(token).ok_or_else(|| Error::RootMargin(input.to_string())))
            .collect::<Result<Vec<_>>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(Error::RootMargin(input.to_string())),
        };
        Ok(Self { top, right, bottom, left })
    }
}

impl FromStr for RootMargin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RootMargin::parse(s)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Options an observer is registered with
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObserverOptions {
    /// Visible fraction at which an element counts as intersecting
    pub threshold: f64,
    pub root_margin: RootMargin,
}

/// Serializable form of [`ObserverOptions`] used in config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSpec {
    #[serde(default)]
    pub threshold: f64,
    #[serde(default = "default_margin")]
    pub root_margin: String,
}

fn default_margin() -> String {
    "0px".to_string()
}

impl ObserverSpec {
    pub fn new(threshold: f64, root_margin: &str) -> Self {
        Self {
            threshold,
            root_margin: root_margin.to_string(),
        }
    }

    pub fn resolve(&self) -> Result<ObserverOptions> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Config(format!(
                "observer threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(ObserverOptions {
            threshold: self.threshold,
            root_margin: RootMargin::parse(&self.root_margin)?,
        })
    }
}

/// Intersection state of one element against the (margin-adjusted) viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub is_intersecting: bool,
    /// Visible fraction of the element in [0, 1]
    pub ratio: f64,
}

/// Compute the intersection of an element with the viewport
///
/// `top` is the element's top edge relative to the viewport, `height` its
/// box height.
pub fn intersect(top: f64, height: f64, viewport_height: f64, options: &ObserverOptions) -> Intersection {
    let margin = &options.root_margin;
    let root_top = -margin.top.resolve(viewport_height);
    let root_bottom = viewport_height + margin.bottom.resolve(viewport_height);
    let bottom = top + height.max(0.0);

    let overlap = bottom.min(root_bottom) - top.max(root_top);
    let ratio = if height <= 0.0 {
        if overlap >= 0.0 { 1.0 } else { 0.0 }
    } else {
        (overlap / height).clamp(0.0, 1.0)
    };
    let visible = overlap > 0.0 || (height <= 0.0 && overlap >= 0.0);

    Intersection {
        is_intersecting: visible && ratio >= options.threshold,
        ratio,
    }
}
