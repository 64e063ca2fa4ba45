use serde::Serialize;

/// Label attached to each query for history and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Dosage,
    SideEffects,
    Interactions,
    Benefits,
    Lifestyle,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dosage => "dosage",
            Category::SideEffects => "side_effects",
            Category::Interactions => "interactions",
            Category::Benefits => "benefits",
            Category::Lifestyle => "lifestyle",
            Category::General => "general",
        }
    }
}

/// Classify a query using keyword heuristics. First matching category wins.
pub fn categorize(query: &str) -> Category {
    let lower = query.to_lowercase();

    if has_dosage_pattern(&lower) {
        return Category::Dosage;
    }
    if has_side_effect_pattern(&lower) {
        return Category::SideEffects;
    }
    if has_interaction_pattern(&lower) {
        return Category::Interactions;
    }
    if has_benefit_pattern(&lower) {
        return Category::Benefits;
    }
    if has_lifestyle_pattern(&lower) {
        return Category::Lifestyle;
    }

    Category::General
}

fn has_dosage_pattern(text: &str) -> bool {
    let patterns = [
        "dose",
        "dosage",
        "how much",
        "how often",
        "missed",
        "inject",
        "titrat",
        "when should i take",
        "milligram",
        " mg",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_side_effect_pattern(text: &str) -> bool {
    let patterns = [
        "side effect",
        "adverse",
        "reaction",
        "nausea",
        "vomit",
        "diarrhea",
        "constipation",
        "headache",
        "dizzy",
        "fatigue",
        "symptom",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_interaction_pattern(text: &str) -> bool {
    let patterns = [
        "interact",
        "interaction",
        "other medication",
        "other drug",
        "together with",
        "combine",
        "combining",
        "alcohol",
        "contraindicat",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_benefit_pattern(text: &str) -> bool {
    let patterns = [
        "benefit",
        "advantage",
        "weight loss",
        "lose weight",
        "a1c",
        "blood sugar",
        "glucose",
        "improve",
        "effectiveness",
        "how well",
    ];
    patterns.iter().any(|p| text.contains(p))
}

fn has_lifestyle_pattern(text: &str) -> bool {
    let patterns = [
        "diet",
        "exercise",
        "food",
        " eat",
        "meal",
        "lifestyle",
        "activity",
        "sleep",
        "fasting",
    ];
    patterns.iter().any(|p| text.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dosage_queries() {
        assert_eq!(categorize("What dose should I take?"), Category::Dosage);
        assert_eq!(
            categorize("I missed my injection yesterday"),
            Category::Dosage
        );
        assert_eq!(categorize("How often is it taken?"), Category::Dosage);
    }

    #[test]
    fn side_effect_queries() {
        assert_eq!(categorize("What are side effects?"), Category::SideEffects);
        assert_eq!(
            categorize("I have been feeling nausea lately"),
            Category::SideEffects
        );
    }

    #[test]
    fn interaction_queries() {
        assert_eq!(
            categorize("Can I drink alcohol with this?"),
            Category::Interactions
        );
        assert_eq!(
            categorize("Does it interact with metformin?"),
            Category::Interactions
        );
    }

    #[test]
    fn benefit_queries() {
        assert_eq!(
            categorize("Will this improve my A1C?"),
            Category::Benefits
        );
        assert_eq!(
            categorize("What are the benefits for weight loss?"),
            Category::Benefits
        );
    }

    #[test]
    fn lifestyle_queries() {
        assert_eq!(
            categorize("What should I eat while on this?"),
            Category::Lifestyle
        );
        assert_eq!(categorize("Can I exercise after it?"), Category::Lifestyle);
    }

    #[test]
    fn unmatched_queries_are_general() {
        assert_eq!(categorize("Tell me a joke"), Category::General);
        assert_eq!(categorize("Hello"), Category::General);
    }

    #[test]
    fn first_matching_category_wins() {
        // Mentions both dosage and side effects; dosage is checked first.
        assert_eq!(
            categorize("Does a higher dose cause more side effects?"),
            Category::Dosage
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Category::Dosage.as_str(), "dosage");
        assert_eq!(Category::SideEffects.as_str(), "side_effects");
        assert_eq!(Category::General.as_str(), "general");
    }
}
