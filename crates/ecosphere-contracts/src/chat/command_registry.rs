#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose whole remainder is one free-text argument, stored under `key`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextCommandSpec {
    pub command: &'static str,
    pub action: &'static str,
    pub key: &'static str,
}

/// Commands taking a fixed list of positional fields; the last `numeric` of them must parse as numbers.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FieldCommandSpec {
    pub command: &'static str,
    pub action: &'static str,
    pub fields: &'static [&'static str],
    pub numeric: usize,
}

pub(crate) const TEXT_ARG_COMMANDS: &[TextCommandSpec] = &[
    TextCommandSpec {
        command: "advice",
        action: "advice",
        key: "prompt",
    },
    TextCommandSpec {
        command: "aqi",
        action: "city_air_quality",
        key: "city",
    },
    TextCommandSpec {
        command: "ask",
        action: "ask",
        key: "question",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "food",
        action: "analyze_food",
    },
    CommandSpec {
        command: "plant",
        action: "analyze_plant",
    },
    CommandSpec {
        command: "waste",
        action: "analyze_waste",
    },
];

pub(crate) const FIELD_COMMANDS: &[FieldCommandSpec] = &[
    FieldCommandSpec {
        command: "aqi_at",
        action: "coordinates_air_quality",
        fields: &["lat", "lon"],
        numeric: 2,
    },
    FieldCommandSpec {
        command: "irrigation",
        action: "irrigation",
        fields: &["crop", "moisture"],
        numeric: 1,
    },
    FieldCommandSpec {
        command: "impact",
        action: "impact",
        fields: &["aqi", "ph"],
        numeric: 2,
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "tip",
        action: "tip",
    },
    CommandSpec {
        command: "reset",
        action: "reset",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/food <image>",
    "/plant <image>",
    "/waste <image>",
    "/advice <text>",
    "/tip",
    "/aqi <city>",
    "/aqi_at <lat> <lon>",
    "/ask <question>",
    "/irrigation <crop> <moisture%>",
    "/impact <aqi> <ph>",
    "/reset",
    "/help",
];
