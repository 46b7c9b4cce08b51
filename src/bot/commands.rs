//! Slash command parsing

use chrono::NaiveDate;

use crate::recipe_model::{MealSlot, RecipeId};

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Recipes,
    Today,
    Plan {
        date: NaiveDate,
        slot: MealSlot,
        recipe_id: RecipeId,
        servings: Option<u32>,
    },
    Unplan(i64),
    Meals(NaiveDate),
    Grocery {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    Favorite(RecipeId),
    Servings {
        recipe_id: RecipeId,
        servings: u32,
        number_of_meals: Option<u32>,
    },
    Delete(RecipeId),
    Cancel,
}

/// Why a command could not be parsed; each variant maps to a usage message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    Usage(&'static str),
}

impl CommandError {
    /// Localization key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            CommandError::Unknown(_) => "command-unknown",
            CommandError::Usage(key) => *key,
        }
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_id(raw: Option<&str>, usage: &'static str) -> Result<i64, CommandError> {
    raw.map(|s| s.trim_start_matches('#'))
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(CommandError::Usage(usage))
}

fn parse_positive(raw: &str, usage: &'static str) -> Result<u32, CommandError> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(CommandError::Usage(usage))
}

/// Parse a message as a slash command; `None` when the text is not a command
pub fn parse_command(text: &str) -> Option<Result<BotCommand, CommandError>> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let mut words = text.split_whitespace();
    let head = words.next()?;
    // Group chats address commands as /cmd@botname
    let name = head[1..].split('@').next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = words.collect();

    Some(parse_args(&name, &args))
}

fn parse_args(name: &str, args: &[&str]) -> Result<BotCommand, CommandError> {
    match name {
        "start" => Ok(BotCommand::Start),
        "help" => Ok(BotCommand::Help),
        "recipes" => Ok(BotCommand::Recipes),
        "today" => Ok(BotCommand::Today),
        "cancel" => Ok(BotCommand::Cancel),
        "plan" => {
            const USAGE: &str = "usage-plan";
            if args.len() < 3 || args.len() > 4 {
                return Err(CommandError::Usage(USAGE));
            }
            let date = parse_date(args[0]).ok_or(CommandError::Usage(USAGE))?;
            let slot = args[1].parse::<MealSlot>().map_err(|_| CommandError::Usage(USAGE))?;
            let recipe_id = parse_id(Some(args[2]), USAGE)?;
            let servings = args
                .get(3)
                .map(|raw| parse_positive(raw, USAGE))
                .transpose()?;
            Ok(BotCommand::Plan {
                date,
                slot,
                recipe_id,
                servings,
            })
        }
        "unplan" => Ok(BotCommand::Unplan(parse_id(args.first().copied(), "usage-unplan")?)),
        "meals" => args
            .first()
            .and_then(|raw| parse_date(raw))
            .map(BotCommand::Meals)
            .ok_or(CommandError::Usage("usage-meals")),
        "grocery" => {
            const USAGE: &str = "usage-grocery";
            if args.len() > 2 {
                return Err(CommandError::Usage(USAGE));
            }
            let mut dates = args.iter().map(|raw| parse_date(raw).ok_or(CommandError::Usage(USAGE)));
            let start = dates.next().transpose()?;
            let end = dates.next().transpose()?;
            Ok(BotCommand::Grocery { start, end })
        }
        "favorite" => Ok(BotCommand::Favorite(parse_id(args.first().copied(), "usage-favorite")?)),
        "servings" => {
            const USAGE: &str = "usage-servings";
            if args.len() < 2 || args.len() > 3 {
                return Err(CommandError::Usage(USAGE));
            }
            let recipe_id = parse_id(Some(args[0]), USAGE)?;
            let servings = parse_positive(args[1], USAGE)?;
            let number_of_meals = args
                .get(2)
                .map(|raw| parse_positive(raw, USAGE))
                .transpose()?;
            Ok(BotCommand::Servings {
                recipe_id,
                servings,
                number_of_meals,
            })
        }
        "delete" => Ok(BotCommand::Delete(parse_id(args.first().copied(), "usage-delete")?)),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_command("2 eggs, 1 cup flour"), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/start"), Some(Ok(BotCommand::Start)));
        assert_eq!(parse_command("/Help@EasyCookBot"), Some(Ok(BotCommand::Help)));
        assert_eq!(parse_command(" /cancel "), Some(Ok(BotCommand::Cancel)));
    }

    #[test]
    fn test_plan_command() {
        assert_eq!(
            parse_command("/plan 2024-05-01 dinner #12 4"),
            Some(Ok(BotCommand::Plan {
                date: date(2024, 5, 1),
                slot: MealSlot::Dinner,
                recipe_id: 12,
                servings: Some(4),
            }))
        );
        assert_eq!(
            parse_command("/plan 2024-05-01 brunch 12"),
            Some(Err(CommandError::Usage("usage-plan")))
        );
        assert_eq!(
            parse_command("/plan 2024-05-01 lunch 12 0"),
            Some(Err(CommandError::Usage("usage-plan")))
        );
    }

    #[test]
    fn test_grocery_command() {
        assert_eq!(
            parse_command("/grocery"),
            Some(Ok(BotCommand::Grocery { start: None, end: None }))
        );
        assert_eq!(
            parse_command("/grocery 2024-05-01 2024-05-03"),
            Some(Ok(BotCommand::Grocery {
                start: Some(date(2024, 5, 1)),
                end: Some(date(2024, 5, 3)),
            }))
        );
        assert_eq!(
            parse_command("/grocery tomorrow"),
            Some(Err(CommandError::Usage("usage-grocery")))
        );
    }

    #[test]
    fn test_servings_command() {
        assert_eq!(
            parse_command("/servings 3 6 2"),
            Some(Ok(BotCommand::Servings {
                recipe_id: 3,
                servings: 6,
                number_of_meals: Some(2),
            }))
        );
        assert_eq!(
            parse_command("/servings 3"),
            Some(Err(CommandError::Usage("usage-servings")))
        );
    }

    #[test]
    fn test_unknown_command() {
        let result = parse_command("/launch now");
        assert_eq!(result, Some(Err(CommandError::Unknown("launch".to_string()))));
        assert_eq!(result.unwrap().unwrap_err().message_key(), "command-unknown");
    }
}
