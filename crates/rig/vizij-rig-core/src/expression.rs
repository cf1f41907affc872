//! Driver expressions as a small tagged AST.
//!
//! Each logical driver ([`DriverAttribute`]) is up to three independent
//! per-axis drivers. A per-axis driver holds its variables and a [`Formula`];
//! the formula renders to the host expression text at the boundary and can be
//! evaluated locally for previews and tests.
//!
//! Face roles scale a marker's `scale.<axis>` channel into the target marker's
//! `location.<axis>`. The tuning factors keep their literal text so rendered
//! expressions stay identical across implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RigError;
use crate::math::Axis;

/// Variable name used by single-source formulas.
pub const SOURCE_VAR: &str = "var";
pub const ORIGIN_VAR: &str = "origin";
pub const HEAD_VAR: &str = "head";
pub const TAIL_VAR: &str = "tail";
pub const LENGTH_VAR: &str = "length";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformChannel {
    Location,
    RotationEuler,
    Scale,
}

impl TransformChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            TransformChannel::Location => "location",
            TransformChannel::RotationEuler => "rotation_euler",
            TransformChannel::Scale => "scale",
        }
    }
}

impl fmt::Display for TransformChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One component of a transform channel, e.g. `scale.z`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChannelPath {
    pub channel: TransformChannel,
    pub axis: Axis,
}

impl ChannelPath {
    pub fn new(channel: TransformChannel, axis: Axis) -> Self {
        Self { channel, axis }
    }
}

impl fmt::Display for ChannelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.channel, self.axis)
    }
}

/// Literal tuning constant. `text` is what ends up in the expression.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Factor {
    pub text: &'static str,
    pub value: f64,
}

pub const EYE_UP_FACTOR: Factor = Factor { text: ".3", value: 0.3 };
pub const EYE_TOP_DOWN_FACTOR: Factor = Factor { text: ".7", value: 0.7 };
pub const MOUTH_UP_FACTOR: Factor = Factor { text: ".3", value: 0.3 };
pub const MOUTH_DOWN_FACTOR: Factor = Factor { text: "-.3", value: -0.3 };
pub const MOUTH_LEFT_FACTOR: Factor = Factor { text: ".05", value: 0.05 };
pub const MOUTH_RIGHT_FACTOR: Factor = Factor { text: "-.05", value: -0.05 };

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Coefficient {
    Distance(f64),
    NegDistance(f64),
    Factor(Factor),
}

impl Coefficient {
    pub fn value(&self) -> f64 {
        match self {
            Coefficient::Distance(d) => *d,
            Coefficient::NegDistance(d) => -*d,
            Coefficient::Factor(f) => f.value,
        }
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coefficient::Distance(d) => write!(f, "{d}"),
            Coefficient::NegDistance(d) => write!(f, "-{d}"),
            Coefficient::Factor(factor) => f.write_str(factor.text),
        }
    }
}

fn product(coefficients: &[Coefficient]) -> f64 {
    coefficients.iter().map(Coefficient::value).product()
}

fn join(coefficients: &[Coefficient]) -> String {
    coefficients
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("*")
}

/// Scaling applied to a single source variable.
#[derive(Clone, Debug, PartialEq)]
pub enum ScaleExpr {
    /// Raw source value.
    Identity,
    /// `c0*c1*...*(var)`
    Scaled(Vec<Coefficient>),
    /// `o0*o1*...+s0*s1*...*(var)`
    Offset {
        offset: Vec<Coefficient>,
        scale: Vec<Coefficient>,
    },
}

impl ScaleExpr {
    /// Text prefixed to the variable reference; empty for [`ScaleExpr::Identity`].
    pub fn prefix(&self) -> String {
        match self {
            ScaleExpr::Identity => String::new(),
            ScaleExpr::Scaled(factors) => format!("{}*", join(factors)),
            ScaleExpr::Offset { offset, scale } => {
                format!("{}+{}*", join(offset), join(scale))
            }
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            ScaleExpr::Identity => x,
            ScaleExpr::Scaled(factors) => product(factors) * x,
            ScaleExpr::Offset { offset, scale } => product(offset) + product(scale) * x,
        }
    }

    /// Full expression around `var`, matching the host driver text.
    pub fn render(&self, var: &str) -> String {
        match self {
            ScaleExpr::Identity => var.to_string(),
            _ => format!("({}({}))", self.prefix(), var),
        }
    }
}

/// Where a limb segment starts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor {
    /// The `origin` variable.
    Variable,
    /// A fixed rig-space coordinate.
    Constant(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    /// One variable through a [`ScaleExpr`].
    Source(ScaleExpr),
    /// `anchor+(head-tail)/length*rig_length`: the detected segment rescaled
    /// to the rig's bone length.
    Segment { anchor: Anchor, rig_length: f64 },
}

impl Formula {
    pub fn render(&self) -> String {
        match self {
            Formula::Source(expr) => expr.render(SOURCE_VAR),
            Formula::Segment { anchor, rig_length } => {
                let anchor = match anchor {
                    Anchor::Variable => ORIGIN_VAR.to_string(),
                    Anchor::Constant(v) => v.to_string(),
                };
                format!("{anchor}+({HEAD_VAR}-{TAIL_VAR})/{LENGTH_VAR}*{rig_length}")
            }
        }
    }

    /// Evaluate with variable values looked up by name.
    ///
    /// A zero `length` collapses the segment onto its anchor.
    pub fn evaluate(&self, lookup: impl Fn(&str) -> Option<f64>) -> Option<f64> {
        match self {
            Formula::Source(expr) => lookup(SOURCE_VAR).map(|x| expr.evaluate(x)),
            Formula::Segment { anchor, rig_length } => {
                let base = match anchor {
                    Anchor::Variable => lookup(ORIGIN_VAR)?,
                    Anchor::Constant(v) => *v,
                };
                let length = lookup(LENGTH_VAR)?;
                if length == 0.0 {
                    return Some(base);
                }
                let head = lookup(HEAD_VAR)?;
                let tail = lookup(TAIL_VAR)?;
                Some(base + (head - tail) / length * rig_length)
            }
        }
    }
}

/// A driver variable reading one channel component of a named object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverVariable {
    pub name: String,
    pub object: String,
    pub path: ChannelPath,
}

impl DriverVariable {
    pub fn new(name: &str, object: &str, path: ChannelPath) -> Self {
        Self {
            name: name.to_string(),
            object: object.to_string(),
            path,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AxisDriver {
    pub variables: Vec<DriverVariable>,
    pub formula: Formula,
}

impl AxisDriver {
    pub fn render(&self) -> String {
        self.formula.render()
    }

    /// Path of the first variable; the "axis mask" entry of this axis.
    pub fn primary_path(&self) -> Option<ChannelPath> {
        self.variables.first().map(|v| v.path)
    }
}

/// Driver specification for one target property, one optional driver per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverAttribute {
    pub target: String,
    pub channel: TransformChannel,
    pub axes: [Option<AxisDriver>; 3],
}

impl DriverAttribute {
    pub fn active_axes(&self) -> impl Iterator<Item = (Axis, &AxisDriver)> {
        self.axes
            .iter()
            .enumerate()
            .filter_map(|(i, d)| Some((Axis::from_index(i)?, d.as_ref()?)))
    }

    /// Per-axis source paths, `""` for inactive axes (e.g. `["", "", "scale.z"]`).
    pub fn axis_masks(&self) -> [String; 3] {
        self.axes.clone().map(|d| {
            d.and_then(|d| d.primary_path())
                .map(|p| p.to_string())
                .unwrap_or_default()
        })
    }

    /// Per-axis scale fragments (`"-0.1*.3*"`), `""` for inactive or raw axes.
    /// Segment formulas report their full text.
    pub fn scale_expressions(&self) -> [String; 3] {
        self.axes.clone().map(|d| match d.map(|d| d.formula) {
            Some(Formula::Source(expr)) => expr.prefix(),
            Some(segment @ Formula::Segment { .. }) => segment.render(),
            None => String::new(),
        })
    }

    /// Every object name the attribute reads from.
    pub fn variable_objects(&self) -> impl Iterator<Item = &str> {
        self.axes
            .iter()
            .flatten()
            .flat_map(|d| d.variables.iter().map(|v| v.object.as_str()))
    }
}

/// Drive `target.location[axis]` from `source.scale[axis]` through `expr`.
pub fn scale_attribute(target: &str, source: &str, axis: Axis, expr: ScaleExpr) -> DriverAttribute {
    let mut axes: [Option<AxisDriver>; 3] = [None, None, None];
    axes[axis.index()] = Some(AxisDriver {
        variables: vec![DriverVariable::new(
            SOURCE_VAR,
            source,
            ChannelPath::new(TransformChannel::Scale, axis),
        )],
        formula: Formula::Source(expr),
    });
    DriverAttribute {
        target: target.to_string(),
        channel: TransformChannel::Location,
        axes,
    }
}

/// Face driver roles. Parsed from their literal names; unknown names are a
/// configuration error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRole {
    EyeUp,
    EyeTopDown,
    MouthUp,
    MouthDown,
    MouthLeft,
    MouthRight,
}

impl FaceRole {
    pub fn as_str(self) -> &'static str {
        match self {
            FaceRole::EyeUp => "eye_up",
            FaceRole::EyeTopDown => "eye_top_down",
            FaceRole::MouthUp => "mouth_up",
            FaceRole::MouthDown => "mouth_down",
            FaceRole::MouthLeft => "mouth_left",
            FaceRole::MouthRight => "mouth_right",
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            FaceRole::MouthLeft | FaceRole::MouthRight => Axis::X,
            _ => Axis::Z,
        }
    }

    /// Scale expression for an average bone distance `d`.
    pub fn scale_expr(self, d: f64) -> ScaleExpr {
        let mouth = |factor| ScaleExpr::Scaled(vec![Coefficient::Distance(d), Coefficient::Factor(factor)]);
        match self {
            FaceRole::EyeUp => ScaleExpr::Scaled(vec![
                Coefficient::NegDistance(d),
                Coefficient::Factor(EYE_UP_FACTOR),
            ]),
            FaceRole::EyeTopDown => ScaleExpr::Offset {
                offset: vec![
                    Coefficient::NegDistance(d),
                    Coefficient::Factor(EYE_TOP_DOWN_FACTOR),
                ],
                scale: vec![Coefficient::Distance(d)],
            },
            FaceRole::MouthUp => mouth(MOUTH_UP_FACTOR),
            FaceRole::MouthDown => mouth(MOUTH_DOWN_FACTOR),
            FaceRole::MouthLeft => mouth(MOUTH_LEFT_FACTOR),
            FaceRole::MouthRight => mouth(MOUTH_RIGHT_FACTOR),
        }
    }

    pub fn attribute(self, target: &str, source: &str, distance: f64) -> DriverAttribute {
        scale_attribute(target, source, self.axis(), self.scale_expr(distance))
    }
}

impl FromStr for FaceRole {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eye_up" => FaceRole::EyeUp,
            "eye_top_down" => FaceRole::EyeTopDown,
            "mouth_up" => FaceRole::MouthUp,
            "mouth_down" => FaceRole::MouthDown,
            "mouth_left" => FaceRole::MouthLeft,
            "mouth_right" => FaceRole::MouthRight,
            other => {
                return Err(RigError::Configuration {
                    role: other.to_string(),
                })
            }
        })
    }
}

impl fmt::Display for FaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
