use serde::{Deserialize, Serialize};

/// The six-field structured representation of a user's stated personal and
/// medical information. Fields default to empty and are filled by merging
/// extraction results; the key set is fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub concern: String,
    #[serde(default)]
    pub target: String,
}

impl Profile {
    pub fn personal_complete(&self) -> bool {
        !self.name.is_empty() && !self.age.is_empty() && !self.location.is_empty()
    }

    pub fn medical_complete(&self) -> bool {
        !self.diagnosis.is_empty() && !self.concern.is_empty() && !self.target.is_empty()
    }

    /// Names of the personal-step fields still empty.
    pub fn missing_personal(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.age.is_empty() {
            missing.push("age");
        }
        if self.location.is_empty() {
            missing.push("location");
        }
        missing
    }

    /// Names of the medical-step fields still empty.
    pub fn missing_medical(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.diagnosis.is_empty() {
            missing.push("diagnosis");
        }
        if self.concern.is_empty() {
            missing.push("concern");
        }
        if self.target.is_empty() {
            missing.push("treatment target");
        }
        missing
    }

    /// Merge another record into this one. An empty incoming value never
    /// clears a populated field; a non-empty value replaces the old one.
    pub fn merge(&mut self, other: &Profile) {
        merge_field(&mut self.name, &other.name);
        merge_field(&mut self.age, &other.age);
        merge_field(&mut self.location, &other.location);
        merge_field(&mut self.diagnosis, &other.diagnosis);
        merge_field(&mut self.concern, &other.concern);
        merge_field(&mut self.target, &other.target);
    }

    /// Human-readable rendering used in prompts and the `profile` command.
    pub fn render(&self) -> String {
        format!(
            "Name: {}\nAge: {}\nLocation: {}\nDiagnosis: {}\nPrimary Concern: {}\nTreatment Target: {}",
            self.name, self.age, self.location, self.diagnosis, self.concern, self.target
        )
    }
}

fn merge_field(dest: &mut String, src: &str) {
    let src = src.trim();
    if !src.is_empty() {
        *dest = src.to_string();
    }
}

/// Where the intake conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStep {
    PersonalInfo,
    MedicalInfo,
    Complete,
}

/// One answered question. Append-only; entries are never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub query: String,
    pub body: String,
    pub sources: String,
    pub category: String,
}

/// Per-session state. Lives in memory for the lifetime of one session and is
/// restored to defaults by `reset`.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub profile: Profile,
    pub analysis: Option<String>,
    pub history: Vec<ChatEntry>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> IntakeStep {
        if !self.profile.personal_complete() {
            IntakeStep::PersonalInfo
        } else if !self.profile.medical_complete() {
            IntakeStep::MedicalInfo
        } else {
            IntakeStep::Complete
        }
    }

    /// Merge extracted fields into the profile. Any change to the profile
    /// invalidates a previously computed analysis.
    pub fn merge_fields(&mut self, fields: &Profile) {
        let before = self.profile.clone();
        self.profile.merge(fields);
        if self.profile != before {
            self.analysis = None;
        }
    }

    pub fn set_analysis(&mut self, analysis: String) {
        self.analysis = Some(analysis);
    }

    pub fn record(&mut self, entry: ChatEntry) {
        self.history.push(entry);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_profile() -> Profile {
        Profile {
            name: "Jane".into(),
            age: "50".into(),
            location: "Boston".into(),
            diagnosis: "type 2 diabetes".into(),
            concern: "blood sugar".into(),
            target: "A1C control".into(),
        }
    }

    #[test]
    fn merge_fills_empty_fields() {
        let mut profile = Profile::default();
        profile.merge(&Profile {
            name: "Jane".into(),
            age: "50".into(),
            ..Default::default()
        });
        assert_eq!(profile.name, "Jane");
        assert_eq!(profile.age, "50");
        assert!(profile.location.is_empty());
    }

    #[test]
    fn merge_never_clears_populated_fields() {
        let mut profile = filled_profile();
        profile.merge(&Profile::default());
        assert_eq!(profile, filled_profile());
    }

    #[test]
    fn merge_replaces_with_newer_nonempty_value() {
        let mut profile = filled_profile();
        profile.merge(&Profile {
            age: "51".into(),
            ..Default::default()
        });
        assert_eq!(profile.age, "51");
        assert_eq!(profile.name, "Jane");
    }

    #[test]
    fn merge_trims_whitespace_only_values() {
        let mut profile = filled_profile();
        profile.merge(&Profile {
            name: "   ".into(),
            ..Default::default()
        });
        assert_eq!(profile.name, "Jane");
    }

    #[test]
    fn step_advances_with_completion() {
        let mut session = SessionContext::new();
        assert_eq!(session.step(), IntakeStep::PersonalInfo);

        session.merge_fields(&Profile {
            name: "Jane".into(),
            age: "50".into(),
            location: "Boston".into(),
            ..Default::default()
        });
        assert_eq!(session.step(), IntakeStep::MedicalInfo);

        session.merge_fields(&filled_profile());
        assert_eq!(session.step(), IntakeStep::Complete);
    }

    #[test]
    fn profile_edit_discards_analysis() {
        let mut session = SessionContext::new();
        session.merge_fields(&filled_profile());
        session.set_analysis("analysis text".into());

        session.merge_fields(&Profile {
            concern: "weight management".into(),
            ..Default::default()
        });
        assert!(session.analysis.is_none());
    }

    #[test]
    fn unchanged_merge_keeps_analysis() {
        let mut session = SessionContext::new();
        session.merge_fields(&filled_profile());
        session.set_analysis("analysis text".into());

        session.merge_fields(&Profile::default());
        assert_eq!(session.analysis.as_deref(), Some("analysis text"));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut session = SessionContext::new();
        session.merge_fields(&filled_profile());
        session.set_analysis("analysis".into());
        session.record(ChatEntry {
            query: "q".into(),
            body: "b".into(),
            sources: "s".into(),
            category: "general".into(),
        });

        session.reset();
        assert_eq!(session.profile, Profile::default());
        assert!(session.analysis.is_none());
        assert!(session.history.is_empty());
        assert_eq!(session.step(), IntakeStep::PersonalInfo);
    }

    #[test]
    fn missing_fields_are_named() {
        let profile = Profile {
            name: "Jane".into(),
            ..Default::default()
        };
        assert_eq!(profile.missing_personal(), vec!["age", "location"]);
        assert_eq!(
            profile.missing_medical(),
            vec!["diagnosis", "concern", "treatment target"]
        );
    }
}
