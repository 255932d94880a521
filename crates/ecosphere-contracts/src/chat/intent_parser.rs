use std::collections::BTreeMap;

use serde_json::{Number, Value};

use super::command_registry::{
    CommandSpec, FieldCommandSpec, FIELD_COMMANDS, NO_ARG_COMMANDS, SINGLE_PATH_COMMANDS,
    TEXT_ARG_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub message: Option<String>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            message: None,
            command_args: BTreeMap::new(),
        }
    }

    fn invalid(command: &str, reason: String) -> Self {
        let mut intent = Self::new("invalid");
        intent
            .command_args
            .insert("command".to_string(), Value::String(command.to_string()));
        intent
            .command_args
            .insert("reason".to_string(), Value::String(reason));
        intent
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args.get(key).and_then(Value::as_str)
    }

    pub fn arg_f64(&self, key: &str) -> Option<f64> {
        self.command_args.get(key).and_then(Value::as_f64)
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = split_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let parsed: f64 = raw.trim_end_matches('%').parse().ok()?;
    Number::from_f64(parsed).map(Value::Number)
}

fn parse_fields(spec: &FieldCommandSpec, arg: &str) -> Result<BTreeMap<String, Value>, String> {
    let parts = split_args(arg);
    let text_fields = spec.fields.len() - spec.numeric;
    let enough = if text_fields == 1 {
        parts.len() > spec.numeric
    } else {
        parts.len() == spec.fields.len()
    };
    if !enough {
        return Err(format!("expected {}", spec.fields.join(" ")));
    }

    let split_at = parts.len() - spec.numeric;
    let mut args = BTreeMap::new();
    if text_fields == 1 {
        args.insert(
            spec.fields[0].to_string(),
            Value::String(parts[..split_at].join(" ")),
        );
    } else {
        for (field, part) in spec.fields.iter().zip(&parts[..split_at]) {
            args.insert((*field).to_string(), Value::String(part.clone()));
        }
    }
    for (field, part) in spec.fields[text_fields..].iter().zip(&parts[split_at..]) {
        let value = parse_number(part).ok_or_else(|| format!("{field} must be a number"))?;
        args.insert((*field).to_string(), value);
    }
    Ok(args)
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop");
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(spec) = TEXT_ARG_COMMANDS.iter().find(|spec| spec.command == command) {
                if arg.is_empty() {
                    return Intent::invalid(&command, format!("expected {}", spec.key));
                }
                let mut intent = Intent::new(spec.action);
                intent
                    .command_args
                    .insert(spec.key.to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let path = parse_single_path_arg(arg);
                if path.is_empty() {
                    return Intent::invalid(&command, "expected an image path".to_string());
                }
                let mut intent = Intent::new(action);
                intent
                    .command_args
                    .insert("path".to_string(), Value::String(path));
                return intent;
            }

            if let Some(spec) = FIELD_COMMANDS.iter().find(|spec| spec.command == command) {
                return match parse_fields(spec, arg) {
                    Ok(args) => {
                        let mut intent = Intent::new(spec.action);
                        intent.command_args = args;
                        intent
                    }
                    Err(reason) => Intent::invalid(&command, reason),
                };
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action);
            }

            let mut intent = Intent::new("unknown");
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("chat");
    intent.message = Some(raw_trimmed.to_string());
    intent
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn plain_text_is_a_chat_message() {
        let intent = parse_intent("  How do I compost coffee grounds?  ");
        assert_eq!(intent.action, "chat");
        assert_eq!(
            intent.message.as_deref(),
            Some("How do I compost coffee grounds?")
        );
    }

    #[test]
    fn blank_input_is_noop() {
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn parse_analysis_paths() {
        let food = parse_intent("/food \"/tmp/my lunch.jpg\"");
        assert_eq!(food.action, "analyze_food");
        assert_eq!(food.command_args["path"], json!("/tmp/my lunch.jpg"));

        assert_eq!(parse_intent("/plant leaf.png").action, "analyze_plant");
        assert_eq!(parse_intent("/WASTE can.webp").action, "analyze_waste");
    }

    #[test]
    fn analysis_without_path_is_invalid() {
        let intent = parse_intent("/food");
        assert_eq!(intent.action, "invalid");
        assert_eq!(intent.command_args["command"], json!("food"));
    }

    #[test]
    fn parse_text_commands() {
        let aqi = parse_intent("/aqi New Delhi");
        assert_eq!(aqi.action, "city_air_quality");
        assert_eq!(aqi.arg_str("city"), Some("New Delhi"));

        let ask = parse_intent("/ask is that safe for kids?");
        assert_eq!(ask.action, "ask");
        assert_eq!(ask.arg_str("question"), Some("is that safe for kids?"));

        assert_eq!(parse_intent("/advice").action, "invalid");
    }

    #[test]
    fn parse_coordinates() {
        let intent = parse_intent("/aqi_at 28.61 77.21");
        assert_eq!(intent.action, "coordinates_air_quality");
        assert_eq!(intent.arg_f64("lat"), Some(28.61));
        assert_eq!(intent.arg_f64("lon"), Some(77.21));

        let bad = parse_intent("/aqi_at north 77.21");
        assert_eq!(bad.action, "invalid");
        assert_eq!(bad.command_args["reason"], json!("lat must be a number"));
    }

    #[test]
    fn irrigation_joins_multi_word_crop() {
        let intent = parse_intent("/irrigation sweet corn 40%");
        assert_eq!(intent.action, "irrigation");
        assert_eq!(intent.arg_str("crop"), Some("sweet corn"));
        assert_eq!(intent.arg_f64("moisture"), Some(40.0));

        assert_eq!(parse_intent("/irrigation 40").action, "invalid");
    }

    #[test]
    fn impact_needs_both_readings() {
        let intent = parse_intent("/impact 120 7.2");
        assert_eq!(intent.action, "impact");
        assert_eq!(intent.arg_f64("aqi"), Some(120.0));
        assert_eq!(intent.arg_f64("ph"), Some(7.2));

        assert_eq!(parse_intent("/impact 120").action, "invalid");
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/tip").action, "tip");
        assert_eq!(parse_intent("/reset").action, "reset");
        assert_eq!(parse_intent("/help").action, "help");
    }

    #[test]
    fn parse_unknown_command() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }
}
