//! Exercise library and workout templates
//!
//! The bundled catalog ships inside the binary as TOML and is parsed once
//! per process. It is read-only and can be shared between threads freely.

use crate::errors::CatalogError;
use crate::models::{Exercise, ExperienceLevel, WorkoutTemplate};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.toml");

static BUNDLED: Lazy<Catalog> =
    Lazy::new(|| Catalog::from_toml(BUNDLED_CATALOG).expect("bundled catalog is valid"));

#[derive(Debug, Deserialize)]
struct CatalogFile {
    exercises: Vec<Exercise>,
    #[serde(default)]
    templates: Vec<WorkoutTemplate>,
}

/// Search criteria for the exercise library. All set criteria must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseFilter {
    /// Case-insensitive match on the name or any primary muscle
    pub text: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub level: Option<ExperienceLevel>,
}

impl ExerciseFilter {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty())
            && self.muscle_group.is_none()
            && self.equipment.is_none()
            && self.level.is_none()
    }

    fn matches(&self, exercise: &Exercise) -> bool {
        let matches_text = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                exercise.name.to_lowercase().contains(&needle)
                    || exercise
                        .primary_muscles
                        .iter()
                        .any(|m| m.to_lowercase().contains(&needle))
            }
            _ => true,
        };

        matches_text
            && self
                .muscle_group
                .as_ref()
                .map_or(true, |g| &exercise.muscle_group == g)
            && self
                .equipment
                .as_ref()
                .map_or(true, |e| &exercise.equipment == e)
            && self.level.map_or(true, |l| exercise.level == l)
    }
}

/// Read-only exercise library and template list
#[derive(Debug, Clone)]
pub struct Catalog {
    exercises: Vec<Exercise>,
    templates: Vec<WorkoutTemplate>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// The catalog bundled with the application
    pub fn bundled() -> &'static Catalog {
        &BUNDLED
    }

    /// Parse a catalog document. Exercise and template ids must be unique;
    /// templates may reference ids that are not in the library.
    pub fn from_toml(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::new(file.exercises, file.templates)
    }

    pub fn new(
        exercises: Vec<Exercise>,
        templates: Vec<WorkoutTemplate>,
    ) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(exercises.len());
        for (i, exercise) in exercises.iter().enumerate() {
            if by_id.insert(exercise.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateExercise(exercise.id.clone()));
            }
        }

        let mut template_ids = std::collections::HashSet::new();
        for template in &templates {
            if !template_ids.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateTemplate(template.id.clone()));
            }
        }

        Ok(Self {
            exercises,
            templates,
            by_id,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.by_id.get(id).map(|&i| &self.exercises[i])
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn templates(&self) -> &[WorkoutTemplate] {
        &self.templates
    }

    pub fn template(&self, id: &str) -> Option<&WorkoutTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Distinct muscle groups in library order
    pub fn muscle_groups(&self) -> Vec<&str> {
        distinct(self.exercises.iter().map(|e| e.muscle_group.as_str()))
    }

    /// Distinct equipment in library order
    pub fn equipment(&self) -> Vec<&str> {
        distinct(self.exercises.iter().map(|e| e.equipment.as_str()))
    }

    /// Experience levels used by at least one exercise
    pub fn levels(&self) -> Vec<ExperienceLevel> {
        ExperienceLevel::ALL
            .into_iter()
            .filter(|l| self.exercises.iter().any(|e| e.level == *l))
            .collect()
    }

    pub fn search(&self, filter: &ExerciseFilter) -> Vec<&Exercise> {
        self.exercises.iter().filter(|e| filter.matches(e)).collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::lorem::en::Word;
    use fake::Fake;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = Catalog::bundled();
        assert!(!catalog.exercises().is_empty());
        assert!(!catalog.templates().is_empty());
        assert_eq!(catalog.get("bench-press").map(|e| e.name.as_str()), Some("Bench Press"));
    }

    #[test]
    fn test_bundled_templates_reference_known_exercises() {
        let catalog = Catalog::bundled();
        for template in catalog.templates() {
            for exercise in &template.exercises {
                assert!(
                    catalog.get(&exercise.exercise_id).is_some(),
                    "template {} references unknown exercise {}",
                    template.id,
                    exercise.exercise_id
                );
            }
        }
    }

    #[test]
    fn test_template_summary() {
        let push = Catalog::bundled().template("push-day").unwrap();
        assert_eq!(push.exercise_count(), 4);
        assert_eq!(push.total_sets(), 10);
    }

    #[test]
    fn test_search_by_text_matches_name_and_primary_muscle() {
        let catalog = Catalog::bundled();
        let by_name = catalog.search(&ExerciseFilter {
            text: Some("bench".to_string()),
            ..Default::default()
        });
        assert_eq!(by_name.len(), 1);

        let by_muscle = catalog.search(&ExerciseFilter {
            text: Some("LATS".to_string()),
            ..Default::default()
        });
        let ids: Vec<&str> = by_muscle.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["pull-up", "barbell-row", "lat-pulldown"]);
    }

    #[test]
    fn test_search_filters_combine() {
        let catalog = Catalog::bundled();
        let results = catalog.search(&ExerciseFilter {
            muscle_group: Some("Legs".to_string()),
            equipment: Some("Barbell".to_string()),
            level: Some(ExperienceLevel::Advanced),
            ..Default::default()
        });
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "deadlift");

        assert_eq!(catalog.search(&ExerciseFilter::default()).len(), catalog.exercises().len());
    }

    #[test]
    fn test_facets_are_distinct() {
        let catalog = Catalog::bundled();
        let groups = catalog.muscle_groups();
        assert_eq!(groups[0], "Chest");
        let mut sorted = groups.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), groups.len());
        assert_eq!(catalog.levels().len(), 3);
    }

    #[test]
    fn test_duplicate_exercise_rejected() {
        let id: String = Word().fake();
        let doc = format!(
            r#"
            [[exercises]]
            id = "{id}"
            name = "A"
            muscle_group = "Chest"
            equipment = "Barbell"
            level = "beginner"

            [[exercises]]
            id = "{id}"
            name = "B"
            muscle_group = "Chest"
            equipment = "Barbell"
            level = "beginner"
            "#
        );
        assert!(matches!(
            Catalog::from_toml(&doc),
            Err(CatalogError::DuplicateExercise(dup)) if dup == id
        ));
    }

    #[test]
    fn test_malformed_catalog_rejected() {
        assert!(matches!(
            Catalog::from_toml("exercises = 3"),
            Err(CatalogError::Parse(_))
        ));
    }
}
