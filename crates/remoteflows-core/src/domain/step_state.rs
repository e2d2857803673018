//! Ordered step state machine shared by all flows.

use remoteflows_jsf::FieldValues;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

/// A flow specific step name
pub trait FlowStep: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Stable snake_case name used in logs, events and telemetry
    fn name(&self) -> &'static str;
}

/// Position of a step within its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<S> {
    pub index: usize,
    pub name: S,
}

/// Outcome of a successful `next`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Moved to the given step
    Advanced(Step<S>),
    /// The terminal step was submitted
    Completed,
}

/// Navigation refused by the state machine or a guard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// `back` on the first step
    #[error("Already at the first step")]
    AtFirstStep,

    /// The resource behind the flow can no longer be edited
    #[error("Navigation locked: resource is read-only in status '{0}'")]
    ReadOnly(String),

    /// `go_to` a step the flow does not have
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    /// Any transition after the terminal step was submitted
    #[error("Flow is already completed")]
    Completed,

    /// Invalid step list
    #[error("Invalid step list: {0}")]
    InvalidSteps(String),
}

/// Current step plus values captured for every visited step
#[derive(Debug, Clone)]
pub struct StepState<S: FlowStep> {
    steps: Vec<S>,
    current: usize,
    values: HashMap<S, FieldValues>,
    completed: bool,
}

impl<S: FlowStep> StepState<S> {
    /// Start at the first of `steps`
    pub fn new(steps: Vec<S>) -> Result<Self, NavigationError> {
        if steps.is_empty() {
            return Err(NavigationError::InvalidSteps("no steps".to_string()));
        }
        for (i, step) in steps.iter().enumerate() {
            if steps[..i].contains(step) {
                return Err(NavigationError::InvalidSteps(format!(
                    "duplicate step '{}'",
                    step.name()
                )));
            }
        }

        Ok(Self {
            steps,
            current: 0,
            values: HashMap::new(),
            completed: false,
        })
    }

    /// Start at `step` instead of the first step
    pub fn resume_at(mut self, step: S) -> Result<Self, NavigationError> {
        self.current = self.require_index(step)?;
        Ok(self)
    }

    #[inline]
    pub fn current_step(&self) -> Step<S> {
        Step {
            index: self.current,
            name: self.steps[self.current],
        }
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn index_of(&self, step: S) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    pub fn contains(&self, step: S) -> bool {
        self.index_of(step).is_some()
    }

    /// Values captured for `step`
    pub fn values_for(&self, step: S) -> Option<&FieldValues> {
        self.values.get(&step)
    }

    /// Store values for any step, e.g. when seeding from a resumed resource
    pub fn set_values(&mut self, step: S, values: FieldValues) {
        self.values.insert(step, values);
    }

    /// Capture values for the current step without moving
    pub fn capture(&mut self, values: FieldValues) {
        let step = self.steps[self.current];
        self.values.insert(step, values);
    }

    /// Capture `values` for the current step, then advance.
    pub fn next(&mut self, values: FieldValues) -> Result<Transition<S>, NavigationError> {
        if self.completed {
            return Err(NavigationError::Completed);
        }

        self.capture(values);

        if self.is_last() {
            self.completed = true;
            return Ok(Transition::Completed);
        }

        self.current += 1;
        Ok(Transition::Advanced(self.current_step()))
    }

    /// Retreat one step. Captured values are kept.
    pub fn back(&mut self) -> Result<Step<S>, NavigationError> {
        if self.completed {
            return Err(NavigationError::Completed);
        }
        if self.current == 0 {
            return Err(NavigationError::AtFirstStep);
        }

        self.current -= 1;
        Ok(self.current_step())
    }

    /// Retreat one step if `guard` allows it; state is unchanged otherwise.
    pub fn back_guarded<F>(&mut self, guard: F) -> Result<Step<S>, NavigationError>
    where
        F: FnOnce() -> Result<(), NavigationError>,
    {
        guard()?;
        self.back()
    }

    /// Jump directly to `step`
    pub fn go_to(&mut self, step: S) -> Result<Step<S>, NavigationError> {
        if self.completed {
            return Err(NavigationError::Completed);
        }
        self.current = self.require_index(step)?;
        Ok(self.current_step())
    }

    /// All captured values merged in step order; later steps win.
    pub fn merged_values(&self) -> FieldValues {
        let mut merged = FieldValues::new();
        for step in &self.steps {
            if let Some(values) = self.values.get(step) {
                for (key, value) in values {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.steps.len()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn require_index(&self, step: S) -> Result<usize, NavigationError> {
        self.index_of(step)
            .ok_or_else(|| NavigationError::UnknownStep(step.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Wizard {
        One,
        Two,
        Three,
    }

    impl FlowStep for Wizard {
        fn name(&self) -> &'static str {
            match self {
                Wizard::One => "one",
                Wizard::Two => "two",
                Wizard::Three => "three",
            }
        }
    }

    fn values(value: serde_json::Value) -> FieldValues {
        serde_json::from_value(value).unwrap()
    }

    fn state() -> StepState<Wizard> {
        StepState::new(vec![Wizard::One, Wizard::Two, Wizard::Three]).unwrap()
    }

    #[test]
    fn test_rejects_invalid_step_lists() {
        assert!(StepState::<Wizard>::new(vec![]).is_err());
        assert!(StepState::new(vec![Wizard::One, Wizard::One]).is_err());
    }

    #[test]
    fn test_next_captures_before_advancing() {
        let mut state = state();

        let transition = state.next(values(json!({ "name": "Ada" }))).unwrap();

        assert_eq!(
            transition,
            Transition::Advanced(Step {
                index: 1,
                name: Wizard::Two
            })
        );
        assert_eq!(state.values_for(Wizard::One).unwrap()["name"], "Ada");
    }

    #[test]
    fn test_values_survive_back_navigation() {
        let mut state = state();
        state.next(values(json!({ "name": "Ada" }))).unwrap();
        state.next(values(json!({ "salary": 10 }))).unwrap();

        state.back().unwrap();
        state.back().unwrap();

        assert!(state.is_first());
        assert_eq!(state.values_for(Wizard::One).unwrap()["name"], "Ada");
        assert_eq!(state.values_for(Wizard::Two).unwrap()["salary"], 10);
        assert_eq!(state.back(), Err(NavigationError::AtFirstStep));
    }

    #[test]
    fn test_guard_failure_leaves_state_unchanged() {
        let mut state = state();
        state.next(FieldValues::new()).unwrap();

        let result =
            state.back_guarded(|| Err(NavigationError::ReadOnly("invited".to_string())));

        assert_eq!(result, Err(NavigationError::ReadOnly("invited".to_string())));
        assert_eq!(state.current_step().index, 1);
    }

    #[test]
    fn test_terminal_step_completes() {
        let mut state = state().resume_at(Wizard::Three).unwrap();

        assert_eq!(state.next(FieldValues::new()), Ok(Transition::Completed));
        assert!(state.is_completed());
        assert_eq!(state.current_step().name, Wizard::Three);
        assert_eq!(state.next(FieldValues::new()), Err(NavigationError::Completed));
        assert_eq!(state.back(), Err(NavigationError::Completed));
    }

    #[test]
    fn test_go_to_and_merged_values() {
        let mut state = StepState::new(vec![Wizard::One, Wizard::Two]).unwrap();
        state.next(values(json!({ "a": 1, "shared": "first" }))).unwrap();
        state.capture(values(json!({ "b": 2, "shared": "second" })));

        assert_eq!(state.go_to(Wizard::One).unwrap().index, 0);
        assert_eq!(
            serde_json::Value::Object(state.merged_values()),
            json!({ "a": 1, "shared": "second", "b": 2 })
        );
    }
}
