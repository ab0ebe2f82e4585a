//! `ollabot tools`: List the tools the agent can call.

use ollabot_core::provider::ToolDefinition;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = ollabot_tools::default_registry();

    println!("🔧 Agent Tools ({})", registry.len());
    println!("==================");
    for definition in registry.definitions() {
        println!("  {}", describe(&definition));
    }

    Ok(())
}

/// One line per tool: name, argument names, description.
fn describe(definition: &ToolDefinition) -> String {
    let args: Vec<&str> = definition
        .parameters
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default();
    format!(
        "{:<20} ({}) {}",
        definition.name,
        args.join(", "),
        definition.description
    )
}
