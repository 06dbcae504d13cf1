//! Parameter evaluators measure a property of a motion (speed, turn rate,
//! direction) so blend-space positions can be computed instead of entered
//! by hand.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::fmt;

use glam::Vec3;

use crate::motion::MotionInstance;

/// Name of the evaluator that measures nothing.
pub const NULL_EVALUATOR: &str = "None";

const SAMPLE_COUNT: usize = 64;

/// Computes one scalar from the trajectory of a motion.
pub trait ParamEvaluator: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn compute_param_value(&self, instance: &MotionInstance) -> f32;

    /// The null evaluator cannot drive automatic positions.
    fn is_null(&self) -> bool {
        false
    }
}

/// Root trajectory of a motion sampled at fixed steps.
struct TrajectorySamples {
    positions: Vec<Vec3>,
    headings: Vec<f32>,
    duration: f32,
}

impl TrajectorySamples {
    fn collect(instance: &MotionInstance) -> Self {
        let motion = instance.motion();
        let duration = motion.duration();
        let steps = if duration > f32::EPSILON { SAMPLE_COUNT } else { 1 };

        let mut positions = Vec::with_capacity(steps + 1);
        let mut headings = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            let time = duration * i as f32 / steps as f32;
            let root = motion.root_transform(time);
            positions.push(root.translation);
            headings.push(root.heading());
        }

        Self {
            positions,
            headings,
            duration,
        }
    }

    fn displacement(&self) -> Vec3 {
        match (self.positions.first(), self.positions.last()) {
            (Some(first), Some(last)) => *last - *first,
            _ => Vec3::ZERO,
        }
    }

    fn path_length(&self) -> f32 {
        self.positions
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).length())
            .sum()
    }

    /// Accumulated heading change, unwrapped across the +-PI seam.
    fn total_turn(&self) -> f32 {
        self.headings
            .windows(2)
            .map(|pair| wrap_angle(pair[1] - pair[0]))
            .sum()
    }

    fn per_second(&self, value: f32) -> f32 {
        if self.duration > f32::EPSILON {
            value / self.duration
        } else {
            0.0
        }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Null,
    MoveSpeed,
    TurnSpeed,
    TravelDirection,
    TravelSlope,
    TurnAngle,
    TravelDistance,
    LeftRightVelocity,
    FrontBackVelocity,
}

/// One of the evaluators every registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinEvaluator {
    name: &'static str,
    measure: Measure,
}

impl BuiltinEvaluator {
    pub const ALL: [Self; 9] = [
        Self::new(NULL_EVALUATOR, Measure::Null),
        Self::new("Move speed", Measure::MoveSpeed),
        Self::new("Turn speed", Measure::TurnSpeed),
        Self::new("Travel direction", Measure::TravelDirection),
        Self::new("Travel slope", Measure::TravelSlope),
        Self::new("Turn angle", Measure::TurnAngle),
        Self::new("Travel distance", Measure::TravelDistance),
        Self::new("Left-right velocity", Measure::LeftRightVelocity),
        Self::new("Front-back velocity", Measure::FrontBackVelocity),
    ];

    const fn new(name: &'static str, measure: Measure) -> Self {
        Self { name, measure }
    }
}

impl ParamEvaluator for BuiltinEvaluator {
    fn name(&self) -> &str {
        self.name
    }

    fn compute_param_value(&self, instance: &MotionInstance) -> f32 {
        if self.measure == Measure::Null {
            return 0.0;
        }

        let samples = TrajectorySamples::collect(instance);
        let displacement = samples.displacement();
        match self.measure {
            Measure::Null => 0.0,
            Measure::MoveSpeed => samples.per_second(samples.path_length()),
            Measure::TurnSpeed => samples.per_second(samples.total_turn()),
            // Angle from forward (+Y), positive towards +X.
            Measure::TravelDirection => {
                if displacement.truncate().length_squared() <= f32::EPSILON {
                    0.0
                } else {
                    displacement.x.atan2(displacement.y)
                }
            }
            Measure::TravelSlope => {
                let horizontal = displacement.truncate().length();
                if horizontal <= f32::EPSILON && displacement.z.abs() <= f32::EPSILON {
                    0.0
                } else {
                    displacement.z.atan2(horizontal)
                }
            }
            Measure::TurnAngle => samples.total_turn(),
            Measure::TravelDistance => displacement.length(),
            Measure::LeftRightVelocity => samples.per_second(displacement.x),
            Measure::FrontBackVelocity => samples.per_second(displacement.y),
        }
    }

    fn is_null(&self) -> bool {
        self.measure == Measure::Null
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Evaluators by name, case-insensitive.
#[derive(Debug)]
pub struct EvaluatorRegistry {
    evaluators: Vec<Box<dyn ParamEvaluator>>,
    index: HashMap<String, usize>,
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for evaluator in BuiltinEvaluator::ALL {
            registry.register(evaluator);
        }
        registry
    }
}

impl EvaluatorRegistry {
    /// Registry with the built-in evaluators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            evaluators: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds an evaluator, replacing one with the same name.
    pub fn register(&mut self, evaluator: impl ParamEvaluator + 'static) {
        let key = normalize_name(evaluator.name());
        let boxed: Box<dyn ParamEvaluator> = Box::new(evaluator);
        match self.index.get(&key) {
            Some(&slot) => self.evaluators[slot] = boxed,
            None => {
                self.index.insert(key, self.evaluators.len());
                self.evaluators.push(boxed);
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ParamEvaluator> {
        self.index
            .get(&normalize_name(name))
            .and_then(|slot| self.evaluators.get(*slot))
            .map(|evaluator| evaluator.as_ref())
    }

    /// `true` when `name` resolves to a usable, non-null evaluator.
    #[must_use]
    pub fn is_usable(&self, name: &str) -> bool {
        self.get(name).is_some_and(|evaluator| !evaluator.is_null())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.evaluators.iter().map(|evaluator| evaluator.name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}
