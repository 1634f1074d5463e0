//! Process-wide runtime switches ("field trials").
//!
//! A field trial string is a sequence of `Name/Group/` pairs, e.g.
//! `"WebRTC-Agc2SimdAvx2KillSwitch/Enabled/"`. A trial counts as enabled when
//! its group name starts with `Enabled`.

use std::collections::BTreeMap;

/// Read access to field trials.
///
/// Implemented for closures so tests can simulate any combination of
/// switches without building a trial string.
pub trait FieldTrialsView {
    /// Returns the group name of `name`, if the trial is present.
    fn lookup(&self, name: &str) -> Option<&str>;

    fn is_enabled(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|group| group.starts_with("Enabled"))
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|group| group.starts_with("Disabled"))
    }
}

/// No trial is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFieldTrials;

impl FieldTrialsView for NoFieldTrials {
    fn lookup(&self, _name: &str) -> Option<&str> {
        None
    }
}

impl<F> FieldTrialsView for F
where
    F: Fn(&str) -> bool,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self(name).then_some("Enabled")
    }
}

/// Errors returned when parsing a field trial string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTrialsError {
    /// The string does not end with a group for every trial name.
    MissingGroup(String),
    /// A trial name or group name is empty.
    EmptySegment,
    /// The same trial is listed twice with different groups.
    Conflict(String),
}

impl std::fmt::Display for FieldTrialsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGroup(name) => write!(f, "field trial {name:?} has no group"),
            Self::EmptySegment => write!(f, "empty field trial name or group"),
            Self::Conflict(name) => write!(f, "field trial {name:?} is set to conflicting groups"),
        }
    }
}

impl std::error::Error for FieldTrialsError {}

/// Parsed field trial string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTrials {
    trials: BTreeMap<String, String>,
}

impl FieldTrials {
    /// Parses a `Name/Group/Name/Group/` string. The trailing `/` is optional.
    pub fn parse(s: &str) -> Result<Self, FieldTrialsError> {
        let mut trials = BTreeMap::new();
        let body = s.strip_suffix('/').unwrap_or(s);
        if body.is_empty() {
            return Ok(Self { trials });
        }

        let mut segments = body.split('/');
        while let Some(name) = segments.next() {
            let group = segments
                .next()
                .ok_or_else(|| FieldTrialsError::MissingGroup(name.to_string()))?;
            if name.is_empty() || group.is_empty() {
                return Err(FieldTrialsError::EmptySegment);
            }
            match trials.get(name) {
                Some(existing) if existing != group => {
                    return Err(FieldTrialsError::Conflict(name.to_string()));
                }
                Some(_) => {}
                None => {
                    if !group.starts_with("Enabled") && !group.starts_with("Disabled") {
                        tracing::warn!(trial = name, group, "unrecognized field trial group");
                    }
                    trials.insert(name.to_string(), group.to_string());
                }
            }
        }
        Ok(Self { trials })
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

impl FieldTrialsView for FieldTrials {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.trials.get(name).map(String::as_str)
    }
}
