// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build configuration: limits, draw policy, and the textual draw options.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use understory_mesh_tree::BoundsPolicy;
use understory_placement::{
    DEFAULT_MAX_ITERATIONS, GraphError, NodeId, PlacementGraph, VisFlags, count_nodes,
};

/// Depth at or above which the depth limit is ignored.
pub const UNBOUNDED_DEPTH: u32 = 9999;

/// Summed node count below the root that `limit` keeps the scene under.
pub const LIMIT_CEILING: u64 = 10_000;

/// Decides whether a built instance is drawn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DrawPolicy {
    /// Drawn if on-screen, or below the root and visible itself.
    #[default]
    OnScreenOrThis,
    /// The root is drawn if on-screen or visible; anything deeper is drawn if
    /// some ancestor's volume has daughters visible.
    Daughters,
    /// Drawn if visible itself.
    ThisOnly,
    /// Everything is drawn, ignoring visibility bits.
    All,
}

impl DrawPolicy {
    /// Apply the policy to a volume's bits at `depth` below the build root.
    ///
    /// [`VisFlags::NONE`] hides the instance under every policy except [`DrawPolicy::All`].
    pub fn is_drawn(self, vis: VisFlags, depth: u32, ancestor_daughters: bool) -> bool {
        if self == Self::All {
            return true;
        }
        if vis.contains(VisFlags::NONE) {
            return false;
        }
        match self {
            Self::OnScreenOrThis => {
                vis.contains(VisFlags::ON_SCREEN) || (depth > 0 && vis.contains(VisFlags::THIS))
            }
            Self::Daughters if depth == 0 => vis.intersects(VisFlags::ON_SCREEN | VisFlags::THIS),
            Self::Daughters => ancestor_daughters,
            Self::ThisOnly => vis.contains(VisFlags::THIS),
            Self::All => true,
        }
    }
}

bitflags::bitflags! {
    /// Helper drawing requested by the host. The builder only carries these.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
    pub struct DebugFlags: u8 {
        /// Wireframe overlays on drawn units.
        const DEBUG  = 1 << 0;
        /// Axis and grid helpers.
        const GRID   = 1 << 1;
        /// Bounding box helpers.
        const BOUNDS = 1 << 2;
        /// Apply helpers to units that are not drawn as well.
        const FULL   = 1 << 3;
    }
}

/// Configuration of one build session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize), serde(default))]
pub struct BuildOptions {
    /// Levels built below the root. `0` builds the root alone; [`UNBOUNDED_DEPTH`]
    /// or more means no limit.
    pub max_depth: u32,
    /// Node visits after which expansion stops. `None` for no ceiling.
    pub node_budget: Option<usize>,
    /// Work done per [`SceneBuilder::run_for`](crate::SceneBuilder::run_for) when driven by
    /// [`SceneBuilder::run_to_completion`](crate::SceneBuilder::run_to_completion).
    pub time_slice: Duration,
    /// Wall-clock time since start after which expansion stops. `None` for no limit.
    pub time_limit: Option<Duration>,
    /// Which instances are drawn.
    pub draw_policy: DrawPolicy,
    /// How the final scene bounds are computed.
    pub bounds_policy: BoundsPolicy,
    /// Cap on shared-subtree resolver passes.
    pub resolve_iterations: u32,
    /// Helpers requested by the host.
    pub debug: DebugFlags,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_depth: UNBOUNDED_DEPTH,
            node_budget: Some(3000),
            time_slice: Duration::from_millis(300),
            time_limit: Some(Duration::from_secs(10)),
            draw_policy: DrawPolicy::default(),
            bounds_policy: BoundsPolicy::default(),
            resolve_iterations: DEFAULT_MAX_ITERATIONS,
            debug: DebugFlags::empty(),
        }
    }
}

impl BuildOptions {
    /// Options with no node ceiling and no time limit.
    pub fn unlimited() -> Self {
        Self {
            node_budget: None,
            time_limit: None,
            ..Self::default()
        }
    }

    /// Depth budget handed to the root frame, with [`UNBOUNDED_DEPTH`] mapped to no limit.
    pub(crate) fn depth_budget(&self) -> u32 {
        if self.max_depth >= UNBOUNDED_DEPTH {
            u32::MAX
        } else {
            self.max_depth
        }
    }

    /// Apply parsed textual options.
    ///
    /// [`DepthRequest::Limit`] counts the graph below `root` to pick the depth.
    pub fn apply<S>(
        &mut self,
        draw: &DrawOptions,
        graph: &PlacementGraph<S>,
        root: NodeId,
    ) -> Result<(), GraphError> {
        match draw.depth {
            Some(DepthRequest::Levels(n)) => self.max_depth = n,
            Some(DepthRequest::Unbounded) => self.max_depth = UNBOUNDED_DEPTH,
            Some(DepthRequest::Limit) => {
                let counts = count_nodes(graph, root)?;
                self.max_depth = counts
                    .depth_for_ceiling(LIMIT_CEILING)
                    .unwrap_or(UNBOUNDED_DEPTH);
            }
            None => {}
        }
        self.debug |= draw.debug;
        Ok(())
    }
}

/// Depth selection in textual draw options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepthRequest {
    /// `maxlvlN`
    Levels(u32),
    /// `all`
    Unbounded,
    /// `limit`
    Limit,
}

/// Parsed textual draw options, such as `"all;d"` or `"maxlvl3 b"`.
///
/// Keywords are matched case-insensitively anywhere in the text: `all`,
/// `limit`, and `maxlvl` followed by digits. After removing those, the letters
/// `d`, `g`, `b` and `f` select [`DebugFlags`]. Anything else is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawOptions {
    /// Requested depth, if any.
    pub depth: Option<DepthRequest>,
    /// Requested helpers.
    pub debug: DebugFlags,
}

/// Malformed textual draw options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// `maxlvl` was not followed by a level number.
    #[error("`maxlvl` must be followed by a level number")]
    MissingLevel,
    /// The level number does not fit.
    #[error("level `{0}` is out of range")]
    LevelOutOfRange(String),
}

impl FromStr for DrawOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut text = s.to_ascii_lowercase();
        let mut out = Self::default();

        if let Some(p) = text.find("all") {
            out.depth = Some(DepthRequest::Unbounded);
            text.replace_range(p..p + 3, " ");
        }
        if let Some(p) = text.find("limit") {
            out.depth = Some(DepthRequest::Limit);
            text.replace_range(p..p + 5, " ");
        }
        if let Some(p) = text.find("maxlvl") {
            let digits_start = p + 6;
            let digits_len = text[digits_start..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            if digits_len == 0 {
                return Err(OptionsError::MissingLevel);
            }
            let digits = &text[digits_start..digits_start + digits_len];
            let level = digits
                .parse()
                .map_err(|_| OptionsError::LevelOutOfRange(digits.to_owned()))?;
            out.depth = Some(DepthRequest::Levels(level));
            text.replace_range(p..digits_start + digits_len, " ");
        }

        for (letter, flag) in [
            ('d', DebugFlags::DEBUG),
            ('g', DebugFlags::GRID),
            ('b', DebugFlags::BOUNDS),
            ('f', DebugFlags::FULL),
        ] {
            if text.contains(letter) {
                out.debug |= flag;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_placement::{Node, Volume};

    #[test]
    fn policy_bits() {
        let this = VisFlags::THIS;
        assert!(!DrawPolicy::OnScreenOrThis.is_drawn(this, 0, false), "root needs on-screen");
        assert!(DrawPolicy::OnScreenOrThis.is_drawn(this, 1, false));
        assert!(DrawPolicy::OnScreenOrThis.is_drawn(VisFlags::ON_SCREEN, 0, false));

        assert!(DrawPolicy::Daughters.is_drawn(this, 0, false));
        assert!(!DrawPolicy::Daughters.is_drawn(this, 2, false));
        assert!(DrawPolicy::Daughters.is_drawn(VisFlags::empty(), 2, true));

        let hidden = VisFlags::THIS | VisFlags::ON_SCREEN | VisFlags::NONE;
        for policy in [
            DrawPolicy::OnScreenOrThis,
            DrawPolicy::Daughters,
            DrawPolicy::ThisOnly,
        ] {
            assert!(!policy.is_drawn(hidden, 1, true), "{policy:?} must honor NONE");
        }
        assert!(DrawPolicy::All.is_drawn(hidden, 1, false));
    }

    #[test]
    fn parse_keywords_and_letters() {
        let all: DrawOptions = "ALL;d".parse().unwrap();
        assert_eq!(all.depth, Some(DepthRequest::Unbounded));
        assert_eq!(all.debug, DebugFlags::DEBUG);

        let lvl: DrawOptions = "maxlvl12,gb".parse().unwrap();
        assert_eq!(lvl.depth, Some(DepthRequest::Levels(12)));
        assert_eq!(lvl.debug, DebugFlags::GRID | DebugFlags::BOUNDS);

        let limit: DrawOptions = "limit".parse().unwrap();
        assert_eq!(limit.depth, Some(DepthRequest::Limit));
        assert!(limit.debug.is_empty(), "keyword letters are consumed");

        assert_eq!("".parse::<DrawOptions>().unwrap(), DrawOptions::default());
        assert_eq!(
            "maxlvl".parse::<DrawOptions>(),
            Err(OptionsError::MissingLevel)
        );
    }

    #[test]
    fn limit_picks_depth_from_counts() {
        // 1 root, 100 children, 100 * 200 grandchildren.
        let mut g: PlacementGraph<()> = PlacementGraph::new();
        let top = g.add_volume(Volume::new("top", None));
        let row = g.add_volume(Volume::new("row", None));
        let cell = g.add_volume(Volume::new("cell", None));
        let root = g.add_root(top).unwrap();
        for i in 0..100 {
            g.place(top, Node::new(format!("row{i}"), row)).unwrap();
        }
        for i in 0..200 {
            g.place(row, Node::new(format!("cell{i}"), cell)).unwrap();
        }

        let mut opts = BuildOptions::default();
        opts.apply(&"limit".parse().unwrap(), &g, root).unwrap();
        assert_eq!(opts.max_depth, 1);

        opts.apply(&"all".parse().unwrap(), &g, root).unwrap();
        assert_eq!(opts.max_depth, UNBOUNDED_DEPTH);
        assert_eq!(opts.depth_budget(), u32::MAX);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_config_keeps_defaults() {
        let opts: BuildOptions =
            serde_json::from_str(r#"{ "max_depth": 4, "draw_policy": "Daughters" }"#).unwrap();
        assert_eq!(opts.max_depth, 4);
        assert_eq!(opts.draw_policy, DrawPolicy::Daughters);
        assert_eq!(opts.node_budget, Some(3000));
        assert_eq!(opts.time_slice, Duration::from_millis(300));
    }
}
