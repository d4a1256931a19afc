pub const POEM_SYSTEM: &str = include_str!("../data/prompts/poem_system.txt");
pub const POEM_USER: &str = include_str!("../data/prompts/poem_user.txt");

/// JSON schema of the structured model output: `{ "poem": string }`.
pub fn poem_output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "poem": {
                "type": "string",
                "description": "A poem inspired by the image."
            }
        },
        "required": ["poem"],
        "additionalProperties": false
    })
}
