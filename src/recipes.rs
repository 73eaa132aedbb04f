//! Recipe source implementations
//!
//! The in-memory source ships with the built-in recipes. Safe for
//! concurrent reads; updates take the write lock.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::domain::{
    ConditionKind, Ingredient, Recipe, RecipeSource, RecipeSummary, Step, StepCondition,
    TimerConfig,
};
use crate::{Error, Result};

/// In-memory recipe source, preloaded with the built-in recipes
pub struct MemorySource {
    recipes: RwLock<HashMap<String, Recipe>>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Create a recipe source seeded with the built-in recipes
    #[must_use]
    pub fn new() -> Self {
        let mut recipes = HashMap::new();
        for r in [vegetable_stir_fry(), chicken_alfredo()] {
            recipes.insert(r.id.clone(), r);
        }
        tracing::debug!(count = recipes.len(), "seeded recipes");
        Self {
            recipes: RwLock::new(recipes),
        }
    }

    fn summarize(r: &Recipe) -> RecipeSummary {
        RecipeSummary {
            id: r.id.clone(),
            name: r.name.clone(),
            description: r.description.clone(),
            tags: r.tags.clone(),
        }
    }
}

impl RecipeSource for MemorySource {
    fn list(&self) -> Result<Vec<RecipeSummary>> {
        let recipes = self.recipes.read().expect("recipe source poisoned");
        let mut out: Vec<RecipeSummary> = recipes.values().map(Self::summarize).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn get(&self, id: &str) -> Result<Recipe> {
        let recipes = self.recipes.read().expect("recipe source poisoned");
        recipes
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("recipe {id}")))
    }

    fn search(&self, query: &str) -> Result<Vec<RecipeSummary>> {
        let q = query.to_lowercase();
        let recipes = self.recipes.read().expect("recipe source poisoned");
        let out = recipes
            .values()
            .filter(|r| {
                r.name.to_lowercase().contains(&q)
                    || r.description.to_lowercase().contains(&q)
                    || r.tags.iter().any(|t| t.to_lowercase().contains(&q))
            })
            .map(Self::summarize)
            .collect();
        Ok(out)
    }

    fn update(&self, recipe: &Recipe) -> Result<()> {
        let mut recipes = self.recipes.write().expect("recipe source poisoned");
        if !recipes.contains_key(&recipe.id) {
            return Err(Error::NotFound(format!("recipe {}", recipe.id)));
        }
        let mut updated = recipe.clone();
        updated.version += 1;
        tracing::info!(recipe = %updated.name, version = updated.version, "recipe updated");
        recipes.insert(updated.id.clone(), updated);
        Ok(())
    }
}

const MIN: u64 = 60;

fn ingredient(name: &str, quantity: f64, unit: &str, size: &str) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
        size_descriptor: size.to_string(),
        optional: false,
    }
}

fn optional(mut ing: Ingredient) -> Ingredient {
    ing.optional = true;
    ing
}

fn condition(kind: ConditionKind, description: &str) -> StepCondition {
    StepCondition {
        kind,
        description: description.to_string(),
    }
}

fn chicken_alfredo() -> Recipe {
    Recipe {
        id: "chicken-alfredo".to_string(),
        name: "Chicken Alfredo".to_string(),
        description:
            "Creamy spaghetti alfredo with pan-seared chicken. Rich, indulgent, and not from a jar."
                .to_string(),
        servings: 2,
        tags: vec![
            "italian".to_string(),
            "pasta".to_string(),
            "chicken".to_string(),
            "comfort".to_string(),
        ],
        ingredients: vec![
            ingredient("spaghetti", 250.0, "grams", ""),
            ingredient("chicken breast", 2.0, "pieces", "medium"),
            ingredient("creme fraiche", 1.0, "cup", ""),
            ingredient("gruyere cheese", 1.0, "cup", "grated"),
            ingredient("margarine", 3.0, "tablespoons", ""),
            ingredient("garlic", 4.0, "cloves", "medium"),
            ingredient("olive oil", 1.0, "tablespoon", ""),
            ingredient("salt", 0.0, "", "to taste"),
            ingredient("black pepper", 0.0, "", "to taste"),
        ],
        steps: vec![
            Step {
                id: "ca-1".to_string(),
                order: 1,
                instruction: "Bring a large pot of salted water to a boil for the pasta. Don't be shy with the salt -- it should taste like the sea.".to_string(),
                duration: Duration::from_secs(8 * MIN),
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Water is at a rolling boil",
                )],
                parallel_hints: vec![],
                timer: Some(TimerConfig {
                    duration: Duration::from_secs(8 * MIN),
                    label: "Water boiling".to_string(),
                }),
            },
            Step {
                id: "ca-2".to_string(),
                order: 2,
                instruction: "While the water heats, season the chicken breasts with salt and pepper on both sides. Pound them to even thickness if they're uneven -- otherwise the thin end dries out while the thick end is still raw.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Manual,
                    "Chicken is seasoned and even thickness",
                )],
                parallel_hints: vec!["Do this while waiting for water to boil".to_string()],
                timer: None,
            },
            Step {
                id: "ca-3".to_string(),
                order: 3,
                instruction: "Heat olive oil in a skillet over medium-high heat. Sear the chicken for about 6 minutes per side until golden and cooked through. Internal temp should hit 165 F. Set aside and let rest.".to_string(),
                duration: Duration::from_secs(12 * MIN),
                conditions: vec![
                    condition(
                        ConditionKind::Visual,
                        "Chicken is golden brown on both sides, juices run clear",
                    ),
                    condition(
                        ConditionKind::Temperature,
                        "Internal temperature reaches 165°F / 74°C",
                    ),
                ],
                parallel_hints: vec![],
                timer: Some(TimerConfig {
                    duration: Duration::from_secs(12 * MIN),
                    label: "Chicken searing".to_string(),
                }),
            },
            Step {
                id: "ca-4".to_string(),
                order: 4,
                instruction: "Drop the spaghetti into the boiling water. Cook until al dente. Reserve a cup of pasta water before draining.".to_string(),
                duration: Duration::from_secs(10 * MIN),
                conditions: vec![condition(
                    ConditionKind::Time,
                    "About 10 minutes or per package directions",
                )],
                parallel_hints: vec![],
                timer: Some(TimerConfig {
                    duration: Duration::from_secs(10 * MIN),
                    label: "Pasta cooking".to_string(),
                }),
            },
            Step {
                id: "ca-5".to_string(),
                order: 5,
                instruction: "In the same skillet, melt margarine over medium heat. Add minced garlic and cook for about 1 minute until fragrant. Do not burn it -- burnt garlic ruins everything.".to_string(),
                duration: Duration::from_secs(MIN),
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Garlic is fragrant and lightly golden",
                )],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "ca-6".to_string(),
                order: 6,
                instruction: "Stir in the creme fraiche. Bring to a gentle simmer and let it reduce for about 3 minutes, stirring occasionally. It should start to thicken slightly.".to_string(),
                duration: Duration::from_secs(3 * MIN),
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Cream has thickened slightly and coats the back of a spoon",
                )],
                parallel_hints: vec![],
                timer: Some(TimerConfig {
                    duration: Duration::from_secs(3 * MIN),
                    label: "Cream reducing".to_string(),
                }),
            },
            Step {
                id: "ca-7".to_string(),
                order: 7,
                instruction: "Take the pan off the heat. Stir in the gruyere gradually until melted and smooth. If it's too thick, splash in some of that reserved pasta water.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Sauce is smooth, creamy, and coats the pasta well",
                )],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "ca-8".to_string(),
                order: 8,
                instruction: "Slice the rested chicken into strips. Toss the drained pasta into the sauce. Add the chicken on top. Serve immediately -- alfredo does not reheat well.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Manual,
                    "Plated with chicken on top",
                )],
                parallel_hints: vec![],
                timer: None,
            },
        ],
        version: 1,
    }
}

fn vegetable_stir_fry() -> Recipe {
    Recipe {
        id: "vegetable-stir-fry".to_string(),
        name: "Vegetable Stir Fry".to_string(),
        description:
            "Fast, crunchy, and customizable. The key is a screaming hot pan and not overcrowding it."
                .to_string(),
        servings: 2,
        tags: vec![
            "asian".to_string(),
            "vegetables".to_string(),
            "quick".to_string(),
            "vegan".to_string(),
            "healthy".to_string(),
        ],
        ingredients: vec![
            ingredient("bell pepper", 1.0, "pieces", "large"),
            ingredient("broccoli florets", 2.0, "cups", ""),
            ingredient("carrot", 1.0, "pieces", "medium"),
            ingredient("snap peas", 1.0, "cup", ""),
            ingredient("garlic", 3.0, "cloves", "medium"),
            ingredient("fresh ginger", 1.0, "tablespoon", "grated"),
            ingredient("soy sauce", 2.0, "tablespoons", ""),
            ingredient("sesame oil", 1.0, "tablespoon", ""),
            ingredient("vegetable oil", 2.0, "tablespoons", ""),
            optional(ingredient("cornstarch", 1.0, "teaspoon", "")),
            optional(ingredient("rice", 1.0, "cup", "")),
        ],
        steps: vec![
            Step {
                id: "vsf-1".to_string(),
                order: 1,
                instruction: "If serving with rice, start the rice first. Get that going before you touch anything else.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Manual,
                    "Rice is on, or skipped if not using rice",
                )],
                parallel_hints: vec![
                    "Rice cooks in the background while you prep and stir-fry".to_string(),
                ],
                timer: None,
            },
            Step {
                id: "vsf-2".to_string(),
                order: 2,
                instruction: "Prep all vegetables: slice the bell pepper into strips, cut broccoli into small florets, julienne the carrot, trim snap peas. Mince the garlic and grate the ginger. Everything cut BEFORE the pan goes on.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Manual,
                    "All vegetables prepped and within arm's reach",
                )],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "vsf-3".to_string(),
                order: 3,
                instruction: "Mix the sauce: soy sauce, sesame oil, and cornstarch (if using) with 2 tablespoons of water. Set aside.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(ConditionKind::Manual, "Sauce is mixed")],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "vsf-4".to_string(),
                order: 4,
                instruction: "Heat your wok or largest pan on HIGH heat until it just starts to smoke. Add vegetable oil and swirl to coat.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Pan is smoking slightly, oil is shimmering",
                )],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "vsf-5".to_string(),
                order: 5,
                instruction: "Add broccoli and carrots first -- they take longest. Stir-fry for 2 minutes. Then add bell peppers and snap peas. Another 2 minutes. Do NOT stir constantly -- let things get some char.".to_string(),
                duration: Duration::from_secs(4 * MIN),
                conditions: vec![
                    condition(
                        ConditionKind::Visual,
                        "Vegetables are bright colored with some charred edges, still crunchy",
                    ),
                    condition(ConditionKind::Time, "About 4 minutes total"),
                ],
                parallel_hints: vec![],
                timer: Some(TimerConfig {
                    duration: Duration::from_secs(4 * MIN),
                    label: "Stir-fry cooking".to_string(),
                }),
            },
            Step {
                id: "vsf-6".to_string(),
                order: 6,
                instruction: "Push vegetables to the side. Add garlic and ginger to the center of the pan. 30 seconds until fragrant. Then toss everything together.".to_string(),
                duration: Duration::from_secs(30),
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Garlic and ginger are fragrant",
                )],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "vsf-7".to_string(),
                order: 7,
                instruction: "Pour the sauce over everything. Toss to coat evenly. Cook for 30 more seconds until the sauce thickens slightly.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(
                    ConditionKind::Visual,
                    "Sauce coats vegetables, slightly glossy",
                )],
                parallel_hints: vec![],
                timer: None,
            },
            Step {
                id: "vsf-8".to_string(),
                order: 8,
                instruction: "Serve immediately over rice. This does not get better sitting around.".to_string(),
                duration: Duration::ZERO,
                conditions: vec![condition(ConditionKind::Manual, "Plated and ready")],
                parallel_hints: vec![],
                timer: None,
            },
        ],
        version: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted_by_name() {
        let src = MemorySource::new();
        let all = src.list().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Chicken Alfredo");
        assert_eq!(all[1].name, "Vegetable Stir Fry");
    }

    #[test]
    fn get_unknown_is_not_found() {
        let src = MemorySource::new();
        assert!(matches!(src.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn search_matches_tags_case_insensitively() {
        let src = MemorySource::new();
        let hits = src.search("VEGAN").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "vegetable-stir-fry");
    }

    #[test]
    fn search_matches_description() {
        let src = MemorySource::new();
        let hits = src.search("indulgent").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "chicken-alfredo");
    }

    #[test]
    fn update_bumps_version() {
        let src = MemorySource::new();
        let recipe = src.get("chicken-alfredo").unwrap();
        let v = recipe.version;

        src.update(&recipe).unwrap();
        assert_eq!(src.get("chicken-alfredo").unwrap().version, v + 1);

        src.update(&src.get("chicken-alfredo").unwrap()).unwrap();
        assert_eq!(src.get("chicken-alfredo").unwrap().version, v + 2);
    }

    #[test]
    fn update_unknown_recipe_fails() {
        let src = MemorySource::new();
        let mut recipe = src.get("chicken-alfredo").unwrap();
        recipe.id = "ghost".to_string();
        assert!(matches!(src.update(&recipe), Err(Error::NotFound(_))));
    }

    #[test]
    fn steps_are_ordered_one_based() {
        let src = MemorySource::new();
        for summary in src.list().unwrap() {
            let recipe = src.get(&summary.id).unwrap();
            for (i, step) in recipe.steps.iter().enumerate() {
                assert_eq!(step.order as usize, i + 1);
            }
        }
    }
}
