//! Instructions used by the food, plant, waste and monitoring screens.

pub const DAILY_TIP_PROMPT: &str =
    "Give me one short, interesting, and actionable sustainability tip for today. Less than 20 words.";

/// Shown instead of the daily tip when the request degrades.
pub const DAILY_TIP_FALLBACK: &str = "Reduce, Reuse, Recycle!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Food,
    Plant,
    Waste,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [Self::Food, Self::Plant, Self::Waste];

    pub fn name(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Plant => "plant",
            Self::Waste => "waste",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.name() == lowered)
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Food => {
                "Analyze this food image.\n\
                 Identify the food items.\n\
                 Categorize as 'Perishable' or 'Non-Perishable'.\n\
                 Determine the 'status' as 'Fresh', 'Edible but Old', or 'Spoiled'.\n\
                 Estimate approximate quantity/weight in metricLabel1/metricValue1.\n\
                 Suggest if it is suitable for 'Donation', 'Compost', or 'Immediate Consumption' in recommendations."
            }
            Self::Plant => {
                "Analyze this plant image.\n\
                 Identify the plant species.\n\
                 Detect any diseases or nutrient deficiencies.\n\
                 Set status to 'Healthy', 'Diseased', or 'Deficient'.\n\
                 Provide treatment suggestions."
            }
            Self::Waste => {
                "Analyze this waste item.\n\
                 Identify the item.\n\
                 Categorize as 'Recyclable', 'Compostable', 'Landfill', or 'Hazardous'.\n\
                 Provide proper disposal instructions as recommendations.\n\
                 Estimate approximate carbon footprint reduction if recycled in metricLabel1/Value1."
            }
        }
    }
}

pub fn irrigation_prompt(crop: &str, soil_moisture_pct: f64) -> String {
    format!(
        "Act as an agriculture expert.\n\
         The crop is {crop}.\n\
         Soil moisture sensor reading is {soil_moisture_pct}%.\n\
         Suggest an optimal watering schedule for the next 3 days.\n\
         Warn if the current moisture is too low or too high for this specific crop.\n\
         Keep the response concise (max 100 words)."
    )
}

pub fn impact_prompt(aqi: u32, water_ph: f64) -> String {
    format!(
        "Given Air Quality Index (AQI) of {aqi} and Water pH of {water_ph}.\n\
         1. Rate the hazard level (Low/Medium/High).\n\
         2. Suggest 3 immediate actions to reduce pollution or protect health.\n\
         3. Estimate rough daily carbon footprint impact for an average individual in this environment."
    )
}
