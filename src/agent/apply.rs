//! Recipe mutation applier
//!
//! Applies agent-issued actions to a recipe in order, halting on the
//! first failure with the 1-based action index. Callers persist the
//! recipe after a successful application.

use crate::domain::{Ingredient, Recipe, Step, TimerConfig};
use crate::{Error, Result};

use super::actions::{Action, ActionKind};

/// Apply every action in order; the recipe is mutated in place
///
/// # Errors
///
/// Stops at the first action that can't be applied, reporting its
/// index and type.
pub fn apply_actions(recipe: &mut Recipe, actions: &[Action]) -> Result<()> {
    for (i, action) in actions.iter().enumerate() {
        apply_one(recipe, action).map_err(|e| {
            Error::InvalidInput(format!("action {} ({}): {e}", i + 1, action.kind.as_str()))
        })?;
    }
    Ok(())
}

fn apply_one(recipe: &mut Recipe, action: &Action) -> Result<()> {
    match action.kind {
        ActionKind::UpdateIngredient => update_ingredient(recipe, action),
        ActionKind::RemoveIngredient => remove_ingredient(recipe, action),
        ActionKind::AddIngredient => add_ingredient(recipe, action),
        ActionKind::UpdateStep => update_step(recipe, action),
        ActionKind::RemoveStep => remove_step(recipe, action),
        ActionKind::AddStep => add_step(recipe, action),
        ActionKind::UpdateServings => update_servings(recipe, action),
        ActionKind::UpdateTimer => update_timer(recipe, action),
    }
}

/// Case-insensitive substring match on ingredient name
fn find_ingredient(recipe: &Recipe, name: &str) -> Option<usize> {
    let lower = name.to_lowercase();
    recipe
        .ingredients
        .iter()
        .position(|ing| ing.name.to_lowercase().contains(&lower))
}

fn update_ingredient(recipe: &mut Recipe, action: &Action) -> Result<()> {
    let idx = find_ingredient(recipe, &action.ingredient_name).ok_or_else(|| {
        Error::NotFound(format!("ingredient {:?}", action.ingredient_name))
    })?;

    let old_name = recipe.ingredients[idx].name.clone();
    let ing = &mut recipe.ingredients[idx];
    if action.quantity > 0.0 {
        ing.quantity = action.quantity;
    }
    if !action.unit.is_empty() {
        ing.unit = action.unit.clone();
    }
    if !action.size_descriptor.is_empty() {
        ing.size_descriptor = action.size_descriptor.clone();
    }
    if !action.new_ingredient_name.is_empty() {
        ing.name = action.new_ingredient_name.clone();
        // Rename the ingredient everywhere it appears in step text.
        for step in &mut recipe.steps {
            step.instruction = replace_case_insensitive(
                &step.instruction,
                &old_name,
                &action.new_ingredient_name,
            );
        }
    }
    Ok(())
}

fn remove_ingredient(recipe: &mut Recipe, action: &Action) -> Result<()> {
    let idx = find_ingredient(recipe, &action.ingredient_name).ok_or_else(|| {
        Error::NotFound(format!("ingredient {:?}", action.ingredient_name))
    })?;
    recipe.ingredients.remove(idx);
    Ok(())
}

fn add_ingredient(recipe: &mut Recipe, action: &Action) -> Result<()> {
    recipe.ingredients.push(Ingredient {
        name: action.ingredient_name.clone(),
        quantity: action.quantity,
        unit: action.unit.clone(),
        size_descriptor: action.size_descriptor.clone(),
        optional: false,
    });
    Ok(())
}

fn step_index(recipe: &Recipe, index_1based: i64) -> Result<usize> {
    let idx = index_1based - 1;
    if idx < 0 || idx as usize >= recipe.steps.len() {
        return Err(Error::InvalidInput(format!(
            "step {} out of range (1-{})",
            index_1based,
            recipe.steps.len()
        )));
    }
    Ok(idx as usize)
}

fn update_step(recipe: &mut Recipe, action: &Action) -> Result<()> {
    let idx = step_index(recipe, action.step_index)?;
    if !action.instruction.is_empty() {
        recipe.steps[idx].instruction = action.instruction.clone();
    }
    Ok(())
}

fn remove_step(recipe: &mut Recipe, action: &Action) -> Result<()> {
    let idx = step_index(recipe, action.step_index)?;
    recipe.steps.remove(idx);
    renumber(recipe);
    Ok(())
}

fn add_step(recipe: &mut Recipe, action: &Action) -> Result<()> {
    // Past-end (or nonsense) positions append.
    let idx = step_index(recipe, action.step_index).unwrap_or(recipe.steps.len());
    let new_step = Step {
        id: format!("step-{}", recipe.steps.len() + 1),
        order: (idx + 1) as u32,
        instruction: action.instruction.clone(),
        duration: std::time::Duration::ZERO,
        conditions: Vec::new(),
        parallel_hints: Vec::new(),
        timer: None,
    };
    recipe.steps.insert(idx, new_step);
    renumber(recipe);
    Ok(())
}

fn update_servings(recipe: &mut Recipe, action: &Action) -> Result<()> {
    if action.servings <= 0 {
        return Err(Error::InvalidInput(format!(
            "invalid servings: {}",
            action.servings
        )));
    }
    let new = action.servings as u32;
    if recipe.servings > 0 {
        let scale = f64::from(new) / f64::from(recipe.servings);
        for ing in &mut recipe.ingredients {
            ing.quantity *= scale;
        }
    }
    recipe.servings = new;
    Ok(())
}

fn update_timer(recipe: &mut Recipe, action: &Action) -> Result<()> {
    let idx = step_index(recipe, action.step_index)?;
    let duration = action.parsed_timer_duration();
    if duration.is_zero() {
        return Err(Error::InvalidInput(format!(
            "invalid timer duration: {:?}",
            action.timer_duration
        )));
    }
    let step = &mut recipe.steps[idx];
    match &mut step.timer {
        Some(cfg) => {
            cfg.duration = duration;
            if !action.timer_label.is_empty() {
                cfg.label = action.timer_label.clone();
            }
        }
        None => {
            step.timer = Some(TimerConfig {
                duration,
                label: action.timer_label.clone(),
            });
        }
    }
    Ok(())
}

fn renumber(recipe: &mut Recipe) {
    for (i, step) in recipe.steps.iter_mut().enumerate() {
        step.order = (i + 1) as u32;
    }
}

/// Replace every case-insensitive occurrence of `from` with `to`,
/// preserving the surrounding text as-is.
fn replace_case_insensitive(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return text.to_string();
    }
    let lower_text = text.to_lowercase();
    let lower_from = from.to_lowercase();

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(found) = lower_text[pos..].find(&lower_from) {
        let at = pos + found;
        out.push_str(&text[pos..at]);
        out.push_str(to);
        pos = at + from.len();
    }
    out.push_str(&text[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecipeSource;
    use crate::recipes::MemorySource;

    fn alfredo() -> Recipe {
        MemorySource::new().get("chicken-alfredo").unwrap()
    }

    fn action(kind: ActionKind) -> Action {
        serde_json::from_str::<Action>(&format!(r#"{{"type":"{}"}}"#, kind.as_str())).unwrap()
    }

    #[test]
    fn empty_action_list_is_a_no_op() {
        let mut recipe = alfredo();
        let before = recipe.ingredients.len();
        apply_actions(&mut recipe, &[]).unwrap();
        assert_eq!(recipe.ingredients.len(), before);
        assert_eq!(recipe.version, 1);
    }

    #[test]
    fn update_servings_scales_quantities() {
        let mut recipe = alfredo();
        let spaghetti_before = recipe.ingredients[0].quantity;

        let mut act = action(ActionKind::UpdateServings);
        act.servings = 4;
        apply_actions(&mut recipe, &[act]).unwrap();

        assert_eq!(recipe.servings, 4);
        assert!((recipe.ingredients[0].quantity - spaghetti_before * 2.0).abs() < f64::EPSILON);
        // "To taste" quantities stay zero.
        let salt = recipe.ingredients.iter().find(|i| i.name == "salt").unwrap();
        assert_eq!(salt.quantity, 0.0);
    }

    #[test]
    fn update_servings_rejects_nonpositive() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::UpdateServings);
        act.servings = 0;
        assert!(apply_actions(&mut recipe, &[act]).is_err());
    }

    #[test]
    fn rename_rewrites_step_instructions() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::UpdateIngredient);
        act.ingredient_name = "garlic".to_string();
        act.new_ingredient_name = "shallot".to_string();
        apply_actions(&mut recipe, &[act]).unwrap();

        let garlic = recipe.ingredients.iter().find(|i| i.name == "shallot");
        assert!(garlic.is_some());
        // Step 5 mentioned garlic twice; both occurrences rewritten.
        assert!(recipe.steps[4].instruction.contains("shallot"));
        assert!(!recipe.steps[4].instruction.to_lowercase().contains("garlic"));
    }

    #[test]
    fn update_ingredient_matches_substring() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::UpdateIngredient);
        act.ingredient_name = "chicken".to_string();
        act.quantity = 3.0;
        apply_actions(&mut recipe, &[act]).unwrap();

        let chicken = recipe
            .ingredients
            .iter()
            .find(|i| i.name == "chicken breast")
            .unwrap();
        assert_eq!(chicken.quantity, 3.0);
    }

    #[test]
    fn remove_missing_ingredient_reports_index() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::RemoveIngredient);
        act.ingredient_name = "saffron".to_string();
        let err = apply_actions(&mut recipe, &[act]).unwrap_err();
        assert!(err.to_string().contains("action 1"));
        assert!(err.to_string().contains("remove_ingredient"));
    }

    #[test]
    fn add_ingredient_appends() {
        let mut recipe = alfredo();
        let before = recipe.ingredients.len();
        let mut act = action(ActionKind::AddIngredient);
        act.ingredient_name = "parsley".to_string();
        act.quantity = 1.0;
        act.unit = "tablespoon".to_string();
        apply_actions(&mut recipe, &[act]).unwrap();

        assert_eq!(recipe.ingredients.len(), before + 1);
        assert_eq!(recipe.ingredients.last().unwrap().name, "parsley");
    }

    #[test]
    fn remove_step_renumbers() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::RemoveStep);
        act.step_index = 2;
        apply_actions(&mut recipe, &[act]).unwrap();

        assert_eq!(recipe.steps.len(), 7);
        for (i, step) in recipe.steps.iter().enumerate() {
            assert_eq!(step.order as usize, i + 1);
        }
    }

    #[test]
    fn add_step_inserts_and_renumbers() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::AddStep);
        act.step_index = 2;
        act.instruction = "Taste everything.".to_string();
        apply_actions(&mut recipe, &[act]).unwrap();

        assert_eq!(recipe.steps.len(), 9);
        assert_eq!(recipe.steps[1].instruction, "Taste everything.");
        for (i, step) in recipe.steps.iter().enumerate() {
            assert_eq!(step.order as usize, i + 1);
        }
    }

    #[test]
    fn add_step_past_end_appends() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::AddStep);
        act.step_index = 99;
        act.instruction = "Do a victory lap.".to_string();
        apply_actions(&mut recipe, &[act]).unwrap();

        assert_eq!(recipe.steps.last().unwrap().instruction, "Do a victory lap.");
    }

    #[test]
    fn update_step_out_of_range_fails() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::UpdateStep);
        act.step_index = 42;
        act.instruction = "nope".to_string();
        assert!(apply_actions(&mut recipe, &[act]).is_err());
    }

    #[test]
    fn update_timer_sets_or_creates_config() {
        let mut recipe = alfredo();

        // Step 2 has no timer; one is created.
        let mut act = action(ActionKind::UpdateTimer);
        act.step_index = 2;
        act.timer_label = "rest".to_string();
        act.timer_duration = "5m".to_string();
        apply_actions(&mut recipe, &[act]).unwrap();

        let cfg = recipe.steps[1].timer.as_ref().unwrap();
        assert_eq!(cfg.label, "rest");
        assert_eq!(cfg.duration, std::time::Duration::from_secs(300));

        // Step 1 already has one; the duration updates, label stays.
        let mut act = action(ActionKind::UpdateTimer);
        act.step_index = 1;
        act.timer_duration = "10m".to_string();
        apply_actions(&mut recipe, &[act]).unwrap();

        let cfg = recipe.steps[0].timer.as_ref().unwrap();
        assert_eq!(cfg.label, "Water boiling");
        assert_eq!(cfg.duration, std::time::Duration::from_secs(600));
    }

    #[test]
    fn update_timer_rejects_zero_duration() {
        let mut recipe = alfredo();
        let mut act = action(ActionKind::UpdateTimer);
        act.step_index = 1;
        act.timer_duration = "0s".to_string();
        assert!(apply_actions(&mut recipe, &[act]).is_err());
    }

    #[test]
    fn halts_on_first_failure() {
        let mut recipe = alfredo();
        let mut bad = action(ActionKind::RemoveIngredient);
        bad.ingredient_name = "unicorn".to_string();
        let mut good = action(ActionKind::UpdateServings);
        good.servings = 4;

        let err = apply_actions(&mut recipe, &[bad, good]).unwrap_err();
        assert!(err.to_string().contains("action 1"));
        // Second action never ran.
        assert_eq!(recipe.servings, 2);
    }

    #[test]
    fn case_insensitive_replace_preserves_surroundings() {
        assert_eq!(
            replace_case_insensitive("Add Garlic and garlic.", "garlic", "shallot"),
            "Add shallot and shallot."
        );
        assert_eq!(replace_case_insensitive("no hits", "zz", "x"), "no hits");
    }
}
