use crate::domain::Configuration;

/// Actuator change requested by the control policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    TurnOn,
    TurnOff,
    NoChange,
}

impl Transition {
    /// Actuator state the device should end up in, if anything has to change.
    pub fn target_state(self) -> Option<bool> {
        match self {
            Transition::TurnOn => Some(true),
            Transition::TurnOff => Some(false),
            Transition::NoChange => None,
        }
    }
}

/// Decide whether the actuator has to be switched.
///
/// The actuator (air conditioning) is turned on once the window average
/// reaches the device's `max_temperature` and turned off as soon as the
/// average drops below it. `min_temperature` is carried by the device
/// configuration but takes no part in the decision. An average of `None`
/// (no samples yet) never triggers a transition.
pub fn decide(
    average: Option<f64>,
    configuration: &Configuration,
    actuator_on: bool,
) -> Transition {
    let Some(average) = average else {
        return Transition::NoChange;
    };
    let threshold = f64::from(configuration.max_temperature);

    if average >= threshold && !actuator_on {
        Transition::TurnOn
    } else if average < threshold && actuator_on {
        Transition::TurnOff
    } else {
        Transition::NoChange
    }
}
