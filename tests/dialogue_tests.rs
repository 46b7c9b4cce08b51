use anyhow::Result;

use easycook::bot::{parse_command, BotCommand};
use easycook::dialogue::{validate_recipe_name, RecipeDialogueState};
use easycook::recipe_model::{Ingredient, RecipeDraft};

/// Integration test for recipe name dialogue validation
#[tokio::test]
async fn test_recipe_name_dialogue_validation() -> Result<()> {
    // Test valid recipe names
    assert!(validate_recipe_name("Chocolate Chip Cookies").is_ok());
    assert!(validate_recipe_name("  Mom's Lasagna  ").is_ok());

    // Test invalid recipe names
    assert_eq!(validate_recipe_name(""), Err("empty"));
    assert_eq!(validate_recipe_name("   "), Err("empty"));
    assert_eq!(validate_recipe_name(&"a".repeat(256)), Err("too_long"));
    // Length counts characters, not bytes
    assert!(validate_recipe_name(&"é".repeat(255)).is_ok());

    Ok(())
}

/// Dialogue states survive a serde round trip with their draft intact
#[tokio::test]
async fn test_dialogue_state_serialization() -> Result<()> {
    let draft = RecipeDraft::new(
        "Crêpes",
        vec![Ingredient::new("flour", "250 g"), Ingredient::new("milk", "50 cl")],
        vec!["Whisk".to_string(), "Rest".to_string(), "Cook".to_string()],
    );

    let state = RecipeDialogueState::ReviewRecipe {
        draft,
        language_code: Some("fr".to_string()),
        message_id: Some(17),
    };

    let json = serde_json::to_string(&state)?;
    let restored: RecipeDialogueState = serde_json::from_str(&json)?;

    match restored {
        RecipeDialogueState::ReviewRecipe {
            draft,
            language_code,
            message_id,
        } => {
            assert_eq!(draft.title, "Crêpes");
            assert_eq!(draft.ingredients.len(), 2);
            assert_eq!(language_code.as_deref(), Some("fr"));
            assert_eq!(message_id, Some(17));
        }
        _ => panic!("Unexpected dialogue state"),
    }

    Ok(())
}

/// Test basic dialogue functionality
#[tokio::test]
async fn test_dialogue_functionality() -> Result<()> {
    let default_state = RecipeDialogueState::default();
    assert!(matches!(default_state, RecipeDialogueState::Start));

    // /cancel is recognized whatever the dialogue state
    assert_eq!(parse_command("/cancel"), Some(Ok(BotCommand::Cancel)));
    // A recipe name typed during rename is not a command
    assert_eq!(parse_command("Grandma's stew"), None);

    Ok(())
}

/// Unit test for recipe name trimming
#[test]
fn test_recipe_name_trimming() {
    let result = validate_recipe_name("  Test Recipe  ");
    assert_eq!(result.unwrap(), "Test Recipe");
}
